use resona_domain_soundbank::{default_value, GeneratorCategory, GeneratorId, GeneratorRegion};

#[test]
fn default_table_sentinels() {
    assert_eq!(default_value(GeneratorId(8)), 13_500);
    assert_eq!(default_value(GeneratorId(46)), -1);
    assert_eq!(default_value(GeneratorId(20)), 0);

    for id in [21u16, 23, 25, 26, 27, 28, 30, 33, 34, 35, 36, 38] {
        assert_eq!(default_value(GeneratorId(id)), -12_000, "generator {id}");
    }
    assert_eq!(default_value(GeneratorId::KEY_RANGE), 0x7F00);
    assert_eq!(default_value(GeneratorId::VEL_RANGE), 0x7F00);
    assert_eq!(default_value(GeneratorId::VELOCITY), -1);
    assert_eq!(default_value(GeneratorId::SCALE_TUNING), 100);
    assert_eq!(default_value(GeneratorId::OVERRIDING_ROOT_KEY), -1);
}

#[test]
fn default_table_is_total() {
    let listed = [
        8u16, 21, 23, 25, 26, 27, 28, 30, 33, 34, 35, 36, 38, 43, 44, 46, 47, 56, 58,
    ];
    for id in 0..=58u16 {
        let value = default_value(GeneratorId(id));
        if !listed.contains(&id) {
            assert_eq!(value, 0, "generator {id}");
        }
        assert_eq!(value, default_value(GeneratorId(id)));
    }
    assert_eq!(default_value(GeneratorId(4_000)), 0);
}

#[test]
fn absent_generator_reads_default() {
    let region = GeneratorRegion::new();
    assert!(!region.contains(GeneratorId::INITIAL_FILTER_FC));
    assert_eq!(region.short(GeneratorId::INITIAL_FILTER_FC), 13_500);
    assert_eq!(region.short(GeneratorId::ATTACK_VOL_ENV), -12_000);
    assert_eq!(region.range(GeneratorId::KEY_RANGE), (0, 127));
}

#[test]
fn categories_follow_id_groups() {
    for id in [0u16, 1, 2, 3, 4, 12, 45, 50] {
        assert_eq!(GeneratorId(id).category(), Some(GeneratorCategory::Offset));
    }
    assert_eq!(GeneratorId(43).category(), Some(GeneratorCategory::Range));
    assert_eq!(GeneratorId(53).category(), Some(GeneratorCategory::Sample));
    assert_eq!(GeneratorId(56).category(), Some(GeneratorCategory::Tuning));
    assert_eq!(GeneratorId(14).category(), None);
    assert_eq!(GeneratorId::all().count(), 52);
}
