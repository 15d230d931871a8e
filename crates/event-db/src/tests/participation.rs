use super::test_db;
use crate::participation;
use crate::{Database, DbError};

#[test]
fn test_get_or_create_starts_at_zero() {
    let db = test_db();
    let record = db.get_or_create_participation(1, "winter").unwrap();
    assert_eq!(record.currency_balance, 0);
    assert_eq!(record.contribution_total, 0);

    let again = db.get_or_create_participation(1, "winter").unwrap();
    assert_eq!(again.created_at, record.created_at);
}

#[test]
fn test_concurrent_first_touch_creates_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("season.db");
    let first = Database::open(&path).unwrap();
    let second = Database::open(&path).unwrap();

    std::thread::scope(|s| {
        let a = s.spawn(|| first.get_or_create_participation(1, "winter"));
        let b = s.spawn(|| second.get_or_create_participation(1, "winter"));
        a.join().unwrap().unwrap();
        b.join().unwrap().unwrap();
    });

    let count: i64 = first
        .with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM event_participation WHERE user_id = 1 AND event_key = 'winter'",
                [],
                |row| row.get(0),
            )
            .map_err(DbError::from)
        })
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(
        first
            .get_participation(1, "winter")
            .unwrap()
            .unwrap()
            .currency_balance,
        0
    );
}

#[test]
fn test_debit_never_underflows() {
    let db = test_db();
    db.with_conn(|conn| {
        participation::ensure(conn, 1, "winter")?;
        assert_eq!(participation::credit(conn, 1, "winter", 30)?, 1);
        assert_eq!(participation::debit(conn, 1, "winter", 50)?, 0);
        assert_eq!(participation::debit(conn, 1, "winter", 30)?, 1);
        assert_eq!(participation::debit(conn, 1, "winter", 1)?, 0);
        Ok::<_, DbError>(())
    })
    .unwrap();

    let record = db.get_participation(1, "winter").unwrap().unwrap();
    assert_eq!(record.currency_balance, 0);
}

#[test]
fn test_increments_refuse_to_overflow() {
    let db = test_db();
    db.with_conn(|conn| {
        participation::ensure(conn, 1, "winter")?;
        assert_eq!(participation::credit(conn, 1, "winter", i64::MAX)?, 1);
        assert_eq!(participation::credit(conn, 1, "winter", 1)?, 0);
        assert_eq!(participation::add_contribution(conn, 1, "winter", i64::MAX)?, 1);
        assert_eq!(participation::add_contribution(conn, 1, "winter", 1)?, 0);
        assert_eq!(participation::credit(conn, 2, "winter", 1)?, 0);
        Ok::<_, DbError>(())
    })
    .unwrap();

    let record = db.get_participation(1, "winter").unwrap().unwrap();
    assert_eq!(record.currency_balance, i64::MAX);
    assert_eq!(record.contribution_total, i64::MAX);
}

#[test]
fn test_leaderboard_tie_break_by_user_id() {
    let db = test_db();
    db.with_conn(|conn| {
        for (user, amount) in [(3, 50), (2, 80), (1, 80)] {
            participation::ensure(conn, user, "winter")?;
            participation::add_contribution(conn, user, "winter", amount)?;
        }
        participation::ensure(conn, 9, "summer")?;
        participation::add_contribution(conn, 9, "summer", 1000)?;
        Ok::<_, DbError>(())
    })
    .unwrap();

    let board = db.get_leaderboard("winter", 10).unwrap();
    let order: Vec<i64> = board.iter().map(|e| e.user_id).collect();
    assert_eq!(order, vec![1, 2, 3]);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[2].contribution_total, 50);

    assert_eq!(db.get_leaderboard("winter", 2).unwrap().len(), 2);
    assert_eq!(db.get_participation_rank(2, "winter").unwrap(), Some(2));
    assert_eq!(db.get_participation_rank(3, "winter").unwrap(), Some(3));
    assert_eq!(db.get_participation_rank(42, "winter").unwrap(), None);
}
