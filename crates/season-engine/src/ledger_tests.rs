use super::*;
use crate::lifecycle::EventManager;
use crate::state::EventSetup;

fn ledger() -> (EventManager, Ledger) {
    let db = Database::open_in_memory().expect("Failed to create test DB");
    (EventManager::new(db.clone()), Ledger::new(db))
}

#[test]
fn get_or_create_starts_empty() {
    let (_, ledger) = ledger();
    let record = ledger.get_or_create(1, "winter").unwrap();
    assert_eq!(record.currency_balance, 0);
    assert_eq!(record.contribution_total, 0);
}

#[test]
fn concurrent_first_touch_yields_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("season.db");
    let a = Ledger::new(Database::open(&path).unwrap());
    let b = Ledger::new(Database::open(&path).unwrap());

    std::thread::scope(|s| {
        let first = s.spawn(|| a.get_or_create(1, "winter"));
        let second = s.spawn(|| b.get_or_create(1, "winter"));
        assert_eq!(first.join().unwrap().unwrap().currency_balance, 0);
        assert_eq!(second.join().unwrap().unwrap().currency_balance, 0);
    });

    let board = a.get_leaderboard("winter", 10).unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].user_id, 1);
}

#[test]
fn add_and_spend() {
    let (_, ledger) = ledger();
    assert_eq!(ledger.add_currency(1, "winter", 100).unwrap().currency_balance, 100);
    assert_eq!(ledger.spend_currency(1, "winter", 40).unwrap().currency_balance, 60);
    assert_eq!(ledger.spend_currency(1, "winter", 60).unwrap().currency_balance, 0);
}

#[test]
fn negative_amounts_are_rejected() {
    let (_, ledger) = ledger();
    assert!(matches!(
        ledger.add_currency(1, "winter", -5),
        Err(SeasonError::InvalidAmount(-5))
    ));
    assert!(matches!(
        ledger.spend_currency(1, "winter", -5),
        Err(SeasonError::InvalidAmount(-5))
    ));
    assert!(matches!(
        ledger.record_contribution(1, "winter", -5),
        Err(SeasonError::InvalidAmount(-5))
    ));
}

#[test]
fn overspend_leaves_balance_unchanged() {
    let (_, ledger) = ledger();
    ledger.add_currency(1, "winter", 30).unwrap();

    let err = ledger.spend_currency(1, "winter", 31).unwrap_err();
    assert!(matches!(
        err,
        SeasonError::InsufficientFunds {
            balance: 30,
            requested: 31
        }
    ));
    assert!(err.is_user_error());
    assert_eq!(ledger.get_or_create(1, "winter").unwrap().currency_balance, 30);
}

#[test]
fn balance_never_goes_negative_over_mixed_sequence() {
    let (_, ledger) = ledger();
    let ops: &[(bool, i64)] = &[
        (true, 10),
        (false, 7),
        (false, 7),
        (true, 3),
        (false, 6),
        (false, 1),
        (true, 0),
        (false, 0),
    ];

    let mut expected = 0i64;
    for &(is_add, amount) in ops {
        if is_add {
            ledger.add_currency(1, "winter", amount).unwrap();
            expected += amount;
        } else {
            match ledger.spend_currency(1, "winter", amount) {
                Ok(_) => expected -= amount,
                Err(SeasonError::InsufficientFunds { balance, .. }) => {
                    assert!(balance < amount);
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        let balance = ledger.get_or_create(1, "winter").unwrap().currency_balance;
        assert!(balance >= 0);
        assert_eq!(balance, expected);
    }
    assert_eq!(expected, 0);
}

#[test]
fn contribution_is_independent_of_balance() {
    let (_, ledger) = ledger();
    ledger.add_currency(1, "winter", 5).unwrap();
    let record = ledger.record_contribution(1, "winter", 50).unwrap();
    assert_eq!(record.currency_balance, 5);
    assert_eq!(record.contribution_total, 50);
}

#[test]
fn leaderboard_is_deterministic() {
    let (_, ledger) = ledger();
    // A=3, B=2, C=1: B and C tie, C has the earlier id.
    ledger.record_contribution(3, "winter", 50).unwrap();
    ledger.record_contribution(2, "winter", 80).unwrap();
    ledger.record_contribution(1, "winter", 80).unwrap();

    let first: Vec<i64> = ledger
        .get_leaderboard("winter", 10)
        .unwrap()
        .iter()
        .map(|e| e.user_id)
        .collect();
    let second: Vec<i64> = ledger
        .get_leaderboard("winter", 10)
        .unwrap()
        .iter()
        .map(|e| e.user_id)
        .collect();
    assert_eq!(first, vec![1, 2, 3]);
    assert_eq!(first, second);
    assert_eq!(ledger.get_rank(3, "winter").unwrap(), Some(3));
}

#[test]
fn contribute_moves_currency_into_community_goal() {
    let (events, ledger) = ledger();
    events
        .start_event("winter", EventSetup::default().with_milestones([100, 200]))
        .unwrap();
    ledger.add_currency(1, "winter", 120).unwrap();

    let outcome = ledger.contribute(1, 110).unwrap();
    assert_eq!(outcome.record.currency_balance, 10);
    assert_eq!(outcome.record.contribution_total, 110);
    assert_eq!(outcome.progress.total, 110);
    assert_eq!(outcome.progress.reached, vec![100]);

    let err = ledger.contribute(1, 50).unwrap_err();
    assert!(matches!(err, SeasonError::InsufficientFunds { balance: 10, .. }));

    let stored = events.get_event("winter").unwrap().unwrap();
    assert_eq!(stored.state.community_total, 110);
    assert_eq!(
        ledger.get_or_create(1, "winter").unwrap().contribution_total,
        110
    );
}

#[test]
fn contribute_requires_active_event() {
    let (_, ledger) = ledger();
    ledger.add_currency(1, "winter", 10).unwrap();
    assert!(matches!(
        ledger.contribute(1, 5),
        Err(SeasonError::NoActiveEvent)
    ));
    assert!(matches!(
        ledger.contribute(1, 0),
        Err(SeasonError::InvalidAmount(0))
    ));
    assert_eq!(ledger.get_or_create(1, "winter").unwrap().currency_balance, 10);
}

#[test]
fn overflowing_amounts_leave_the_record_readable() {
    let (_, ledger) = ledger();
    ledger.add_currency(1, "winter", i64::MAX).unwrap();
    assert!(matches!(
        ledger.add_currency(1, "winter", 1),
        Err(SeasonError::InvalidAmount(1))
    ));
    ledger.record_contribution(1, "winter", i64::MAX).unwrap();
    assert!(matches!(
        ledger.record_contribution(1, "winter", 1),
        Err(SeasonError::InvalidAmount(1))
    ));

    let record = ledger.get_or_create(1, "winter").unwrap();
    assert_eq!(record.currency_balance, i64::MAX);
    assert_eq!(record.contribution_total, i64::MAX);
    let after = ledger.spend_currency(1, "winter", 5).unwrap();
    assert_eq!(after.currency_balance, i64::MAX - 5);
}
