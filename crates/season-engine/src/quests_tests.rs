use super::*;
use crate::lifecycle::EventManager;
use crate::state::EventSetup;

struct Fixture {
    db: Database,
    events: EventManager,
    quests: QuestTracker,
}

fn fixture(daily_count: usize) -> Fixture {
    let db = Database::open_in_memory().expect("Failed to create test DB");
    let clock = DayClock::from_name("Asia/Ho_Chi_Minh").unwrap();
    Fixture {
        events: EventManager::new(db.clone()),
        quests: QuestTracker::new(db.clone(), clock, daily_count),
        db,
    }
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

fn quest(id: &str, kind: QuestKind, requirement_type: &str, count: i64, reward: i64) -> QuestDefinition {
    QuestDefinition {
        quest_id: id.into(),
        event_key: "winter".into(),
        kind,
        requirement_type: requirement_type.into(),
        requirement_count: count,
        reward,
        description: format!("{requirement_type} x{count}"),
    }
}

/// Active "winter" event with a daily pool of five and two fixed quests.
fn winter(daily_count: usize) -> Fixture {
    let f = fixture(daily_count);
    f.events.start_event("winter", EventSetup::default()).unwrap();
    for (i, kind) in ["fish", "chat", "fish", "gift", "chat"].iter().enumerate() {
        f.quests
            .define_quest(&quest(&format!("d{i}"), QuestKind::Daily, kind, 3, 10))
            .unwrap();
    }
    f.quests
        .define_quest(&quest("f_fish", QuestKind::Fixed, "fish", 50, 200))
        .unwrap();
    f.quests
        .define_quest(&quest("f_gift", QuestKind::Fixed, "gift", 5, 100))
        .unwrap();
    f
}

fn ids(list: &[QuestProgress]) -> Vec<&str> {
    list.iter().map(|q| q.quest_id.as_str()).collect()
}

#[test]
fn define_quest_validates_counts() {
    let f = fixture(3);
    assert!(matches!(
        f.quests.define_quest(&quest("bad", QuestKind::Daily, "fish", 0, 5)),
        Err(SeasonError::InvalidAmount(0))
    ));
    assert!(matches!(
        f.quests.define_quest(&quest("bad", QuestKind::Daily, "fish", 1, -5)),
        Err(SeasonError::InvalidAmount(-5))
    ));
    assert!(f.quests.list_definitions("winter").unwrap().is_empty());
}

#[test]
fn refresh_requires_active_event() {
    let f = fixture(3);
    assert!(matches!(
        f.quests.refresh_daily_quests(1),
        Err(SeasonError::NoActiveEvent)
    ));
}

#[test]
fn refresh_assigns_daily_set_and_fixed_quests() {
    let f = winter(3);
    let list = f
        .quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();

    let daily: Vec<_> = list.iter().filter(|q| q.kind == QuestKind::Daily).collect();
    let fixed: Vec<_> = list.iter().filter(|q| q.kind == QuestKind::Fixed).collect();
    assert_eq!(daily.len(), 3);
    assert_eq!(fixed.len(), 2);
    assert!(daily.iter().all(|q| q.quest_day == "2026-01-01"));
    assert!(list.iter().all(|q| q.progress_count == 0 && !q.claimed));
}

#[test]
fn refresh_twice_same_day_is_idempotent() {
    let f = winter(3);
    let first = f
        .quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();
    f.quests
        .update_progress_at(1, &first[0].quest_id, 2, at("2026-01-01T03:05:00Z"))
        .unwrap();

    // 16:59 UTC is still 2026-01-01 in UTC+7.
    let second = f
        .quests
        .refresh_daily_quests_at(1, at("2026-01-01T16:59:00Z"))
        .unwrap();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(second[0].progress_count, 2);
}

#[test]
fn new_day_replaces_daily_set_and_keeps_fixed_progress() {
    let f = winter(3);
    let day_one = f
        .quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();
    let daily_id = day_one
        .iter()
        .find(|q| q.kind == QuestKind::Daily)
        .map(|q| q.quest_id.clone())
        .unwrap();
    let morning = at("2026-01-01T04:00:00Z");
    f.quests.update_progress_at(1, &daily_id, 3, morning).unwrap();
    f.quests.claim_reward_at(1, &daily_id, morning).unwrap();
    f.quests.update_progress(1, "f_fish", 7).unwrap();

    let day_two = f
        .quests
        .refresh_daily_quests_at(1, at("2026-01-01T17:00:00Z"))
        .unwrap();
    let daily: Vec<_> = day_two.iter().filter(|q| q.kind == QuestKind::Daily).collect();
    assert_eq!(daily.len(), 3);
    assert!(daily.iter().all(|q| q.quest_day == "2026-01-02"));
    assert!(daily.iter().all(|q| !q.claimed && q.progress_count == 0));

    let fixed = day_two.iter().find(|q| q.quest_id == "f_fish").unwrap();
    assert_eq!(fixed.progress_count, 7);
}

#[test]
fn yesterdays_daily_quest_cannot_be_finished_or_claimed() {
    let f = winter(3);
    let day_one = f
        .quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();
    let daily = day_one
        .iter()
        .find(|q| q.kind == QuestKind::Daily)
        .unwrap()
        .clone();
    f.quests
        .update_progress_at(1, &daily.quest_id, 3, at("2026-01-01T04:00:00Z"))
        .unwrap();

    // 17:00 UTC is midnight of 2026-01-02 in UTC+7; no refresh has run yet.
    let next_day = at("2026-01-01T17:00:00Z");
    assert!(matches!(
        f.quests.claim_reward_at(1, &daily.quest_id, next_day),
        Err(SeasonError::QuestNotFound(_))
    ));
    assert!(matches!(
        f.quests.update_progress_at(1, &daily.quest_id, 1, next_day),
        Err(SeasonError::QuestNotFound(_))
    ));
    let completed = f
        .quests
        .record_activity_at(1, &daily.requirement_type, 5, next_day)
        .unwrap();
    assert!(completed.iter().all(|q| q.quest_id != daily.quest_id));

    assert!(f.db.get_participation(1, "winter").unwrap().is_none());
    let row = f.db.get_quest_progress(1, &daily.quest_id).unwrap().unwrap();
    assert!(!row.claimed);
}

#[test]
fn daily_count_is_capped_by_pool() {
    let f = winter(10);
    let list = f
        .quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();
    assert_eq!(
        list.iter().filter(|q| q.kind == QuestKind::Daily).count(),
        5
    );
}

#[test]
fn daily_selection_is_stable_per_day() {
    let pool: Vec<_> = (0..8)
        .map(|i| quest(&format!("d{i}"), QuestKind::Daily, "fish", 1, 1))
        .collect();
    let pick = |day: &str| -> Vec<String> {
        select_daily_set(&pool, "winter", day, 3)
            .into_iter()
            .map(|d| d.quest_id.clone())
            .collect()
    };

    let a = pick("2026-01-01");
    assert_eq!(a.len(), 3);
    assert_eq!(a, pick("2026-01-01"));
    let mut sorted = a.clone();
    sorted.sort();
    assert_eq!(a, sorted);
}

#[test]
fn progress_is_capped_at_requirement() {
    let f = winter(3);
    f.quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();

    let q = f.quests.update_progress(1, "f_gift", 3).unwrap();
    assert_eq!(q.progress_count, 3);
    let q = f.quests.update_progress(1, "f_gift", 10).unwrap();
    assert_eq!(q.progress_count, 5);
    assert!(q.is_complete());
    let q = f.quests.update_progress(1, "f_gift", 1).unwrap();
    assert_eq!(q.progress_count, 5);
}

#[test]
fn update_progress_rejects_unknown_and_negative() {
    let f = winter(3);
    assert!(matches!(
        f.quests.update_progress(1, "nope", 1),
        Err(SeasonError::QuestNotFound(id)) if id == "nope"
    ));
    assert!(matches!(
        f.quests.update_progress(1, "f_gift", -1),
        Err(SeasonError::InvalidAmount(-1))
    ));
}

#[test]
fn record_activity_reports_completed_quests() {
    let f = winter(3);
    f.quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();

    let completed = f.quests.record_activity(1, "gift", 4).unwrap();
    assert!(completed.iter().all(|q| q.quest_id != "f_gift"));

    let completed = f.quests.record_activity(1, "gift", 4).unwrap();
    assert!(completed.iter().any(|q| q.quest_id == "f_gift"));
    assert_eq!(
        f.db.get_quest_progress(1, "f_gift").unwrap().unwrap().progress_count,
        5
    );

    // Already complete, nothing more to report.
    let completed = f.quests.record_activity(1, "gift", 4).unwrap();
    assert!(completed.iter().all(|q| q.quest_id != "f_gift"));
}

#[test]
fn claim_credits_reward_exactly_once() {
    let f = winter(3);
    f.quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();
    f.quests.update_progress(1, "f_gift", 5).unwrap();

    let outcome = f.quests.claim_reward(1, "f_gift").unwrap();
    assert_eq!(outcome.reward, 100);
    assert_eq!(outcome.balance, 100);
    assert!(outcome.quest.claimed);
    assert!(outcome.quest.claimed_at.is_some());

    assert!(matches!(
        f.quests.claim_reward(1, "f_gift"),
        Err(SeasonError::AlreadyClaimed(_))
    ));
    let record = f.db.get_participation(1, "winter").unwrap().unwrap();
    assert_eq!(record.currency_balance, 100);
}

#[test]
fn claim_rejects_incomplete_and_unknown() {
    let f = winter(3);
    f.quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();
    f.quests.update_progress(1, "f_gift", 2).unwrap();

    assert!(matches!(
        f.quests.claim_reward(1, "f_gift"),
        Err(SeasonError::QuestNotComplete {
            progress: 2,
            requirement: 5,
            ..
        })
    ));
    assert!(matches!(
        f.quests.claim_reward(1, "missing"),
        Err(SeasonError::QuestNotFound(_))
    ));
    assert!(f.db.get_participation(1, "winter").unwrap().is_none());
}

#[test]
fn claimed_quest_ignores_further_progress() {
    let f = winter(3);
    f.quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();
    f.quests.update_progress(1, "f_gift", 5).unwrap();
    f.quests.claim_reward(1, "f_gift").unwrap();

    let q = f.quests.update_progress(1, "f_gift", 3).unwrap();
    assert!(q.claimed);
    assert_eq!(q.progress_count, 5);
}

#[test]
fn requirement_snapshot_survives_definition_change() {
    let f = winter(3);
    f.quests
        .refresh_daily_quests_at(1, at("2026-01-01T03:00:00Z"))
        .unwrap();
    f.quests
        .define_quest(&quest("f_gift", QuestKind::Fixed, "gift", 50, 1))
        .unwrap();

    let q = f.db.get_quest_progress(1, "f_gift").unwrap().unwrap();
    assert_eq!(q.requirement, 5);
    assert_eq!(q.reward, 100);
}

#[test]
fn concurrent_claims_pay_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("season.db");
    let clock = DayClock::from_name("UTC").unwrap();
    let a = QuestTracker::new(Database::open(&path).unwrap(), clock, 3);
    let b = QuestTracker::new(Database::open(&path).unwrap(), clock, 3);

    let db = Database::open(&path).unwrap();
    EventManager::new(db.clone())
        .start_event("winter", EventSetup::default())
        .unwrap();
    a.define_quest(&quest("f_gift", QuestKind::Fixed, "gift", 1, 40))
        .unwrap();
    a.refresh_daily_quests(1).unwrap();
    a.update_progress(1, "f_gift", 1).unwrap();

    let results = std::thread::scope(|s| {
        let first = s.spawn(|| a.claim_reward(1, "f_gift"));
        let second = s.spawn(|| b.claim_reward(1, "f_gift"));
        [first.join().unwrap(), second.join().unwrap()]
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(SeasonError::AlreadyClaimed(_))))
    );
    let record = db.get_participation(1, "winter").unwrap().unwrap();
    assert_eq!(record.currency_balance, 40);
}
