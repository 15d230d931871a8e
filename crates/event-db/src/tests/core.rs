use super::test_db;
use crate::server_config::ServerConfig;

#[test]
fn test_open_and_migrate() {
    let db = test_db();
    let settings = db.get_all_settings().unwrap();
    assert!(settings.is_empty());
    assert!(db.list_event_states().unwrap().is_empty());
}

#[test]
fn test_settings_crud() {
    let db = test_db();
    db.set_setting("TIMEZONE", "Asia/Ho_Chi_Minh", "normal").unwrap();
    assert_eq!(
        db.get_setting("TIMEZONE").unwrap(),
        Some("Asia/Ho_Chi_Minh".into())
    );

    assert!(!db.set_setting_if_absent("TIMEZONE", "UTC", "normal").unwrap());
    assert!(db.set_setting_if_absent("SERVER_PORT", "9000", "normal").unwrap());
    assert_eq!(
        db.get_setting("TIMEZONE").unwrap(),
        Some("Asia/Ho_Chi_Minh".into())
    );

    db.delete_setting("TIMEZONE").unwrap();
    assert_eq!(db.get_setting("TIMEZONE").unwrap(), None);
    assert_eq!(db.get_all_settings().unwrap().len(), 1);
}

#[test]
fn test_server_config_columns_are_independent() {
    let db = test_db();
    assert!(db.get_server_config(10).unwrap().is_none());

    db.set_admin_channel(10, Some(111)).unwrap();
    db.set_noitu_channel(10, Some(222)).unwrap();
    assert_eq!(
        db.get_server_config(10).unwrap().unwrap(),
        ServerConfig {
            guild_id: 10,
            admin_channel_id: Some(111),
            noitu_channel_id: Some(222),
        }
    );

    db.set_admin_channel(10, None).unwrap();
    let cfg = db.get_server_config(10).unwrap().unwrap();
    assert_eq!(cfg.admin_channel_id, None);
    assert_eq!(cfg.noitu_channel_id, Some(222));

    db.delete_server_config(10).unwrap();
    assert!(db.get_server_config(10).unwrap().is_none());
}
