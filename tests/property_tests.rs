//! Property tests for registry construction and lookup

use avr_presets::tables::{BLOCK_COUNT, BLOCK_LEN};
use avr_presets::{MalformedKind, NotFound, RawPreset, Registry};
use proptest::prelude::*;
use std::collections::HashSet;

fn preset(table_id: u16, step: u8) -> RawPreset {
    RawPreset {
        name: format!("P{}", table_id),
        table_id: table_id.into(),
        q_factor: 75,
        h_size: 720,
        y_size_ntsc: 480,
        y_size_pal: 576,
        leading_lines_ntsc: 16,
        leading_lines_pal: 22,
        num_fields: 2,
        target_frame_size: 65536,
        quant8: vec![vec![i64::from(step); BLOCK_LEN]; BLOCK_COUNT],
        quant16: vec![vec![i64::from(step) << 8; BLOCK_LEN]; BLOCK_COUNT],
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_distinct_ids_always_load(
        ids in prop::collection::hash_set(any::<u16>(), 0..40),
        step in 1u8..=255,
        missing in any::<u16>(),
    ) {
        let ids: Vec<u16> = ids.into_iter().collect();
        let registry = Registry::from_raw(ids.iter().map(|&id| preset(id, step)).collect()).unwrap();

        prop_assert_eq!(registry.len(), ids.len());
        prop_assert_eq!(registry.ids().collect::<Vec<_>>(), ids.clone());
        for &id in &ids {
            let record = registry.find_by_id(id).unwrap();
            prop_assert_eq!(record.table_id(), id);
            prop_assert_eq!(registry.find_by_name(record.name()).unwrap(), record);
        }
        if !ids.contains(&missing) {
            prop_assert_eq!(registry.find_by_id(missing), Err(NotFound::Id(missing)));
        }
    }

    #[test]
    fn test_any_repeated_id_is_rejected(
        ids in prop::collection::vec(0u16..64, 2..40),
    ) {
        let mut seen = HashSet::new();
        let first_repeat = ids.iter().position(|id| !seen.insert(*id));
        let presets: Vec<RawPreset> = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let mut p = preset(id, 9);
                p.name = format!("N{}", i);
                p
            })
            .collect();

        match (Registry::from_raw(presets), first_repeat) {
            (Ok(registry), None) => prop_assert_eq!(registry.len(), ids.len()),
            (Err(err), Some(index)) => {
                prop_assert_eq!(err.index, index);
                let first_index = ids.iter().position(|&id| id == ids[index]).unwrap();
                prop_assert_eq!(
                    err.kind,
                    MalformedKind::DuplicateTableId { table_id: ids[index], first_index }
                );
            }
            (result, expected) => {
                prop_assert!(false, "unexpected outcome {:?} for repeat at {:?}", result.map(|r| r.len()), expected);
            }
        }
    }

    #[test]
    fn test_out_of_range_steps_rejected(value in prop_oneof![i64::MIN..0, 256i64..100_000]) {
        let mut p = preset(1, 1);
        p.quant8[2][63] = value;
        let err = Registry::from_raw(vec![p]).unwrap_err();
        prop_assert_eq!(err.kind, MalformedKind::ValueOutOfRange { field: "quant8", value });
    }
}
