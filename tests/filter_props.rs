use proptest::prelude::*;

use rusty_tdcia::data::filter::{filter, sample_variance};
use rusty_tdcia::data::model::{Column, LabeledTable};

fn table_strategy() -> impl Strategy<Value = LabeledTable> {
    (1usize..6, 2usize..12).prop_flat_map(|(width, len)| {
        prop::collection::vec(
            prop::collection::vec(
                prop_oneof![Just(1.0), -100.0f64..100.0],
                len,
            ),
            width,
        )
        .prop_map(|cols| {
            let columns = cols
                .into_iter()
                .enumerate()
                .map(|(i, values)| Column::new(format!("v{i}"), values))
                .collect();
            LabeledTable::new(columns).unwrap()
        })
    })
}

proptest! {
    #[test]
    fn keeps_exactly_the_columns_above_threshold(table in table_strategy(), threshold in 0.0f64..500.0) {
        let (reduced, labels) = filter(&table, threshold);
        let expected: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| sample_variance(&c.values) > threshold)
            .map(|c| c.name.clone())
            .collect();
        prop_assert_eq!(&labels, &expected);
        prop_assert_eq!(reduced.labels(), expected);
        for c in reduced.columns() {
            prop_assert_eq!(&c.values, &table.column(&c.name).unwrap().values);
        }
    }

    #[test]
    fn table_and_matrix_agree(table in table_strategy(), threshold in 0.0f64..500.0) {
        let (_, labels) = filter(&table, threshold);
        let matrix = table.to_matrix();
        let (reduced, positions) = filter(&matrix, threshold);
        let from_positions: Vec<String> =
            positions.iter().map(|&p| table.columns()[p].name.clone()).collect();
        prop_assert_eq!(labels, from_positions);
        prop_assert_eq!(reduced.positions(), positions.as_slice());
    }

    #[test]
    fn filtering_is_idempotent(table in table_strategy(), threshold in 0.0f64..500.0) {
        let (once, _) = filter(&table, threshold);
        let (twice, _) = filter(&once, threshold);
        prop_assert_eq!(&once, &twice);

        let (m_once, _) = filter(&table.to_matrix(), threshold);
        let (m_twice, _) = filter(&m_once, threshold);
        prop_assert_eq!(m_once, m_twice);
    }
}

#[test]
fn variance_equal_to_threshold_is_dropped() {
    // sample variance of [0, 2] is exactly 2
    let table = LabeledTable::new(vec![
        Column::new("edge", vec![0.0, 2.0]),
        Column::new("wide", vec![0.0, 4.0]),
    ])
    .unwrap();
    let (_, labels) = filter(&table, 2.0);
    assert_eq!(labels, vec!["wide"]);
    let (_, positions) = filter(&table.to_matrix(), 2.0);
    assert_eq!(positions, vec![1]);
}
