use super::test_db;
use crate::relationships::{self, SharedPet};
use crate::DbError;

#[test]
fn test_pair_is_unordered() {
    let db = test_db();
    db.with_conn(|conn| {
        assert!(relationships::insert(conn, 20, 10, 5, 1_000)?);
        assert!(!relationships::insert(conn, 10, 20, 5, 1_000)?);
        Ok::<_, DbError>(())
    })
    .unwrap();

    let rel = db.get_relationship(10, 20).unwrap().unwrap();
    assert_eq!(rel.user_low, 10);
    assert_eq!(rel.user_high, 20);
    assert_eq!(rel.partner_of(20), Some(10));
    assert_eq!(rel.partner_of(30), None);
    assert_eq!(db.get_relationship(20, 10).unwrap().unwrap().id, rel.id);
}

#[test]
fn test_bump_respects_cooldown() {
    let db = test_db();
    db.with_conn(|conn| {
        relationships::insert(conn, 1, 2, 5, 1_000)?;
        assert_eq!(relationships::bump_affinity(conn, 1, 2, 5, 1_500, 3_600)?, 0);
        assert_eq!(relationships::bump_affinity(conn, 2, 1, 5, 4_600, 3_600)?, 1);
        Ok::<_, DbError>(())
    })
    .unwrap();

    let rel = db.get_relationship(1, 2).unwrap().unwrap();
    assert_eq!(rel.affinity, 10);
    assert_eq!(rel.last_interaction, 4_600);
}

#[test]
fn test_pet_lifecycle() {
    let db = test_db();
    let id = db
        .with_conn(|conn| {
            relationships::insert(conn, 1, 2, 5, 0)?;
            let rel = relationships::get(conn, 1, 2)?.expect("relationship");
            assert!(relationships::insert_pet(conn, rel.id, "Mochi")?);
            assert!(!relationships::insert_pet(conn, rel.id, "Other")?);
            Ok::<_, DbError>(rel.id)
        })
        .unwrap();

    let pet = db.get_shared_pet(id).unwrap().unwrap();
    assert_eq!(pet.name, "Mochi");
    assert_eq!(pet.level, 1);

    db.with_conn(|conn| {
        relationships::update_pet(
            conn,
            &SharedPet {
                exp: 40,
                level: 2,
                last_fed: 99,
                ..pet.clone()
            },
        )
    })
    .unwrap();
    let fed = db.get_shared_pet(id).unwrap().unwrap();
    assert_eq!((fed.exp, fed.level, fed.last_fed), (40, 2, 99));

    let missing = db.with_conn(|conn| {
        relationships::update_pet(
            conn,
            &SharedPet {
                partnership_id: 999,
                ..pet
            },
        )
    });
    assert!(matches!(missing, Err(DbError::NotFound(_))));
}

#[test]
fn test_list_for_user_orders_by_affinity() {
    let db = test_db();
    db.with_conn(|conn| {
        relationships::insert(conn, 1, 2, 5, 0)?;
        relationships::insert(conn, 1, 3, 50, 0)?;
        relationships::insert(conn, 2, 3, 99, 0)?;
        Ok::<_, DbError>(())
    })
    .unwrap();

    let rels = db.get_relationships_for_user(1, 10).unwrap();
    let partners: Vec<i64> = rels.iter().filter_map(|r| r.partner_of(1)).collect();
    assert_eq!(partners, vec![3, 2]);
}
