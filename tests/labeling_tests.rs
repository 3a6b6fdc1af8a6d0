//! End-to-end checks of the injection and labeling pipeline.

use fdia::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::io::Write;
use tempfile::NamedTempFile;

fn random_table(rows: usize, seed: u64) -> SensorTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..rows)
        .map(|i| {
            let readings = (0..REFERENCE_SENSOR_COUNT)
                .map(|_| rng.gen_range(1.0..40.0))
                .collect();
            SensorRow::new(i.to_string(), format!("{}", i * 3600), readings)
        })
        .collect();
    SensorTable::from_rows(rows).unwrap()
}

fn default_labeler() -> DatasetLabeler {
    DatasetLabeler::new(LabelingConfig::default()).unwrap()
}

#[test]
fn row_count_is_preserved() {
    for rows in [1, 2, 17, 300] {
        let table = random_table(rows, rows as u64);
        let dataset = default_labeler()
            .label(&table, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(dataset.features().len(), rows);
        assert_eq!(dataset.labels().len(), rows);
        assert!(dataset
            .features()
            .iter()
            .all(|f| f.len() == REFERENCE_SENSOR_COUNT));
    }
}

#[test]
fn corrupted_rows_differ_in_two_to_five_positions() {
    let table = random_table(1000, 3);
    let dataset = default_labeler()
        .label(&table, &mut StdRng::seed_from_u64(2024))
        .unwrap();

    for (i, (features, label)) in dataset
        .features()
        .iter()
        .zip(dataset.labels())
        .enumerate()
    {
        let source = &table.rows()[i].readings;
        let changed: Vec<usize> = (0..features.len())
            .filter(|&j| features[j] != source[j])
            .collect();

        match label {
            Label::Genuine => assert_eq!(features, source, "row {} must be untouched", i),
            Label::Tampered => {
                assert!(
                    (2..=5).contains(&changed.len()),
                    "row {} changed {} readings",
                    i,
                    changed.len()
                );
                for &j in &changed {
                    assert!(features[j] < source[j], "row {} sensor {} increased", i, j);
                }

                let spec = dataset.corruptions()[i].as_ref().unwrap();
                let recorded: HashSet<usize> = spec.indices.iter().copied().collect();
                assert_eq!(recorded.len(), spec.indices.len());
                assert_eq!(recorded, changed.into_iter().collect::<HashSet<usize>>());
            }
        }
    }
}

#[test]
fn roughly_half_the_rows_are_tampered() {
    let table = random_table(2000, 8);
    let dataset = default_labeler()
        .label(&table, &mut StdRng::seed_from_u64(8))
        .unwrap();
    let share = dataset.tampered_count() as f64 / dataset.len() as f64;
    assert!((0.45..0.55).contains(&share), "tampered share {}", share);
}

#[test]
fn fixed_seed_reproduces_dataset() {
    let table = random_table(250, 4);
    let labeler = default_labeler();

    let a = labeler.label(&table, &mut StdRng::seed_from_u64(77)).unwrap();
    let b = labeler.label(&table, &mut StdRng::seed_from_u64(77)).unwrap();
    let c = labeler.label(&table, &mut StdRng::seed_from_u64(78)).unwrap();

    assert_eq!(a, b);
    assert_ne!(a.labels(), c.labels());
}

#[test]
fn scripted_decisions_example() {
    let rows = (0..4)
        .map(|i| SensorRow::new(i.to_string(), format!("t{}", i), vec![10.0; 11]))
        .collect();
    let table = SensorTable::from_rows(rows).unwrap();
    let decisions = [true, false, true, false];

    let dataset = default_labeler()
        .label_with(&table, &mut StdRng::seed_from_u64(9), |row, _| decisions[row])
        .unwrap();

    let labels: Vec<usize> = dataset.samples().label_values();
    assert_eq!(labels, vec![1, 0, 1, 0]);
    assert_eq!(dataset.features()[1], vec![10.0; 11]);
    assert_eq!(dataset.features()[3], vec![10.0; 11]);
    for row in [0, 2] {
        let lowered = dataset.features()[row]
            .iter()
            .filter(|&&v| v < 10.0)
            .count();
        assert!((2..=5).contains(&lowered));
    }
}

#[test]
fn consecutive_runs_draw_independently() {
    let min_power = random_table(200, 10);
    let labeler = default_labeler();
    let mut rng = StdRng::seed_from_u64(5);

    let first = labeler.label(&min_power, &mut rng).unwrap();
    let second = labeler.label(&min_power, &mut rng).unwrap();

    assert_ne!(first.labels(), second.labels());
}

#[test]
fn split_of_labeled_data_is_stable() {
    let table = random_table(123, 6);
    let dataset = default_labeler()
        .label(&table, &mut StdRng::seed_from_u64(6))
        .unwrap();
    let config = SplitConfig::default();

    let a = train_test_split(dataset.samples(), &config).unwrap();
    let b = train_test_split(dataset.samples(), &config).unwrap();

    assert_eq!(a.train, b.train);
    assert_eq!(a.test, b.test);
    assert_eq!(a.test.len(), 37);
}

#[test]
fn csv_table_flows_through_labeler() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, ",Time,1,2,3,4,5,6,7,8,9,10,11").unwrap();
    for i in 0..6 {
        writeln!(
            file,
            "{},{}:00,5.1,6.2,7.3,8.4,9.5,10.6,11.7,12.8,13.9,14.0,15.1",
            i, i
        )
        .unwrap();
    }
    file.flush().unwrap();

    let table = SensorTable::from_csv(file.path()).unwrap();
    let dataset = default_labeler()
        .label(&table, &mut StdRng::seed_from_u64(12))
        .unwrap();

    assert_eq!(dataset.len(), 6);
    assert_eq!(dataset.tampered_table().columns(), table.columns());
}

#[test]
fn malformed_rows_are_rejected() {
    let narrow = SensorTable::from_rows(vec![SensorRow::new("0", "t", vec![1.0; 10])]).unwrap();
    let err = default_labeler()
        .label(&narrow, &mut StdRng::seed_from_u64(0))
        .unwrap_err();
    assert!(matches!(
        err,
        LabelingError::Row {
            row: 0,
            source: InjectionError::RowTooShort { .. }
        }
    ));
}
