use proptest::prelude::*;
use sfsave::pad::{filler, pad16};
use sfsave::parts::{part_file_name, SaveParts, HEADER_FILE_NAME};
use sfsave::{SaveContainer, SaveHeader};

fn arb_save() -> impl Strategy<Value = SaveContainer> {
    (1u64..64, prop::collection::vec(prop::collection::vec(any::<u8>(), 0..80), 0..20), any::<u64>(), any::<u32>())
        .prop_map(|(part_size, parts, unknown, flags)| {
            // the last part may be short, so total rounds up to the same count
            let total = match parts.len() as u64 {
                0 => 0,
                n => (n - 1) * part_size + 1,
            };
            let header = SaveHeader { unknown, flags, ..SaveHeader::new(total, part_size) };
            SaveContainer::new(header, parts)
        })
}

/// A split save alongside its named blobs in a random order.
fn arb_shuffled_entries() -> impl Strategy<Value = (SaveParts, Vec<(String, Vec<u8>)>)> {
    arb_save().prop_flat_map(|save| {
        let split = save.encode_to_parts().unwrap();
        let mut entries: Vec<(String, Vec<u8>)> = split
            .parts
            .iter()
            .enumerate()
            .map(|(i, p)| (part_file_name(i), p.clone()))
            .collect();
        entries.push((HEADER_FILE_NAME.to_owned(), split.header.clone()));
        (Just(split), Just(entries).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn pad16_properties(n in 0u64..(u64::MAX - 16)) {
        let p = pad16(n).unwrap();
        prop_assert_eq!(pad16(p), Some(p));
        prop_assert!(p - n <= 15);
        prop_assert_eq!(p % 16, 0);
    }

    #[test]
    fn filler_length(len in 0usize..4096) {
        prop_assert_eq!((len + filler(len).len()) % 16, 0);
    }

    #[test]
    fn packed_roundtrip(save in arb_save()) {
        let bytes = save.encode_packed().unwrap();
        prop_assert_eq!(bytes.len() % 16, 0);

        let decoded = SaveContainer::decode_packed(&bytes).unwrap();
        prop_assert_eq!(decoded.header, save.aligned_header().unwrap());
        prop_assert_eq!(decoded.header.part_table_end % 16, 0);
        prop_assert_eq!(&decoded.parts, &save.parts);
    }

    #[test]
    fn split_roundtrip(save in arb_save()) {
        let split = save.encode_to_parts().unwrap();
        let decoded = split.decode().unwrap();
        prop_assert_eq!(decoded.header, save.aligned_header().unwrap());
        prop_assert_eq!(&decoded.parts, &save.parts);
    }

    #[test]
    fn split_order_is_numeric((split, entries) in arb_shuffled_entries()) {
        let rebuilt = SaveParts::from_named(entries).unwrap();
        prop_assert_eq!(rebuilt, split);
    }
}
