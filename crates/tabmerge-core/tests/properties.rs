//! Property tests for the table operations

use std::num::NonZeroUsize;

use proptest::prelude::*;
use tabmerge_core::{chunk, merge, transform, CellValue, Table, TransformOptions};

fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Empty),
        any::<bool>().prop_map(CellValue::Boolean),
        (-5i32..5).prop_map(|n| CellValue::Number(n as f64)),
        "[a-c]{0,2}".prop_map(|s| CellValue::string(s)),
    ]
}

fn table() -> impl Strategy<Value = Table> {
    (1usize..4).prop_flat_map(|width| {
        prop::collection::vec(prop::collection::vec(cell(), width), 0..40).prop_map(move |rows| {
            let columns = (0..width).map(|i| format!("c{}", i)).collect();
            Table::from_rows(columns, rows).unwrap()
        })
    })
}

proptest! {
    #[test]
    fn chunking_is_lossless_and_bounded(t in table(), max in 1usize..12) {
        let chunks = chunk(t.clone(), NonZeroUsize::new(max).unwrap());

        prop_assert_eq!(chunks.len(), (t.row_count() + max - 1) / max);
        for (i, c) in chunks.iter().enumerate() {
            prop_assert!(c.row_count() <= max);
            prop_assert!(c.row_count() > 0);
            if i + 1 < chunks.len() {
                prop_assert_eq!(c.row_count(), max);
            }
            prop_assert_eq!(c.columns(), t.columns());
        }

        let rejoined: Vec<Vec<CellValue>> =
            chunks.into_iter().flat_map(|c| c.into_parts().1).collect();
        prop_assert_eq!(rejoined.as_slice(), t.rows());
    }

    #[test]
    fn projection_and_dedupe_is_idempotent(t in table()) {
        let options = TransformOptions {
            columns: vec!["c0".into()],
            dedupe: true,
            sort_by: None,
        };
        let once = transform(t, &options).unwrap();
        let twice = transform(once.clone(), &options).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merged_row_count_is_sum(a in table(), b in table()) {
        let expected = a.row_count() + b.row_count();
        let merged = merge(vec![a, b]);
        prop_assert_eq!(merged.row_count(), expected);
        prop_assert!(merged.rows().iter().all(|r| r.len() == merged.column_count()));
    }

    #[test]
    fn sorting_keeps_every_row(t in table()) {
        let mut before: Vec<String> = t.rows().iter().map(|r| format!("{:?}", r)).collect();
        let sorted = transform(
            t,
            &TransformOptions { sort_by: Some("c0".into()), ..Default::default() },
        )
        .unwrap();
        let mut after: Vec<String> = sorted.rows().iter().map(|r| format!("{:?}", r)).collect();

        let keys: Vec<&CellValue> = sorted.column_values(0).collect();
        prop_assert!(keys.windows(2).all(|w| w[0].sort_cmp(w[1]) != std::cmp::Ordering::Greater));

        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }
}

#[test]
fn scenario_three_large_files_chunk_into_two_parts() {
    fn file(label: &str, rows: usize, offset: usize) -> Table {
        Table::from_rows(
            vec!["id".into(), label.into()],
            (0..rows)
                .map(|i| {
                    vec![
                        CellValue::Number((offset + i) as f64),
                        CellValue::Number(i as f64),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    let merged = merge(vec![
        file("a", 500_000, 0),
        file("b", 400_000, 500_000),
        file("c", 300_000, 900_000),
    ]);
    assert_eq!(merged.shape(), (1_200_000, 4));
    assert_eq!(merged.columns(), &["id", "a", "b", "c"]);

    let parts = chunk(merged, NonZeroUsize::new(1_000_000).unwrap());
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].row_count(), 1_000_000);
    assert_eq!(parts[1].row_count(), 200_000);
    assert_eq!(parts[1].rows()[0][0], CellValue::Number(1_000_000.0));
}
