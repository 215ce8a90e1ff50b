use super::*;

#[test]
fn env_parse_returns_default_when_unset() {
    assert_eq!(env_parse("MAPCAST_TEST_UNSET_KNOB", 42_u32), 42);
}

#[test]
fn env_parse_reads_valid_value() {
    unsafe { std::env::set_var("MAPCAST_TEST_VALID_KNOB", "7") };
    assert_eq!(env_parse("MAPCAST_TEST_VALID_KNOB", 42_u32), 7);
    unsafe { std::env::remove_var("MAPCAST_TEST_VALID_KNOB") };
}

#[test]
fn env_parse_falls_back_on_garbage() {
    unsafe { std::env::set_var("MAPCAST_TEST_GARBAGE_KNOB", "not-a-number") };
    assert_eq!(env_parse("MAPCAST_TEST_GARBAGE_KNOB", 42_u32), 42);
    unsafe { std::env::remove_var("MAPCAST_TEST_GARBAGE_KNOB") };
}

#[test]
fn env_path_returns_default_when_unset() {
    assert_eq!(env_path("MAPCAST_TEST_UNSET_DIR", "assets/maps"), PathBuf::from("assets/maps"));
}

#[test]
fn frame_interval_matches_fps() {
    let mut config = crate::state::test_helpers::test_config();
    config.target_fps = 20;
    assert_eq!(config.frame_interval(), Duration::from_millis(50));
}

#[test]
fn frame_interval_survives_zero_fps() {
    let mut config = crate::state::test_helpers::test_config();
    config.target_fps = 0;
    assert_eq!(config.frame_interval(), Duration::from_millis(1000));
}
