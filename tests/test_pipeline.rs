//! End-to-end pipeline tests: train, persist, reload, evaluate.

use std::io::Write;
use std::path::{Path, PathBuf};

use churnml::config::PipelineParams;
use churnml::data::{load_csv, preprocess, select_features};
use churnml::metrics::MetricName;
use churnml::models::ChurnModel;
use churnml::pipeline::{evaluate, Trainer};

/// A separable synthetic churn dataset: churners have short tenure, high
/// monthly charges, and monthly contracts.
fn write_churn_csv(dir: &Path, name: &str, rows: usize) -> PathBuf {
    let mut csv = String::from("customer_id,tenure,monthly_charges,contract,churn\n");
    for i in 0..rows {
        let churn = i % 3 == 0;
        let tenure = if churn { 1 + i % 6 } else { 24 + i % 36 };
        let charges = if churn {
            85.0 + (i % 20) as f64
        } else {
            25.0 + (i % 30) as f64
        };
        let contract = match (churn, i % 2) {
            (true, _) => "monthly",
            (false, 0) => "yearly",
            (false, _) => "two_year",
        };
        csv.push_str(&format!(
            "{},{},{:.2},{},{}\n",
            i, tenure, charges, contract, churn as u8
        ));
    }
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(csv.as_bytes()).unwrap();
    path
}

fn write_params(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("params.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn train_logistic_produces_requested_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_churn_csv(dir.path(), "churn.csv", 120);
    let params_path = write_params(
        dir.path(),
        "model:\n  type: LogisticRegression\n  max_iter: 500\n\
         metrics:\n  - accuracy\n  - roc_auc\n",
    );

    let params = PipelineParams::load(&params_path).unwrap();
    let model_out = dir.path().join("model.json");
    let metrics_out = dir.path().join("metrics.json");

    let mut trainer = Trainer::new(params);
    let report = trainer.run(&data, &model_out, &metrics_out).unwrap();

    let acc = report.get(MetricName::Accuracy).unwrap();
    let auc = report.get(MetricName::RocAuc).unwrap();
    assert!((0.0..=1.0).contains(&acc));
    assert!((0.0..=1.0).contains(&auc));
    // The dataset is separable; a fitted model should do clearly better
    // than chance
    assert!(acc > 0.7, "accuracy {}", acc);
    assert!(auc > 0.7, "roc_auc {}", auc);

    // Report on disk matches request order
    let raw = std::fs::read_to_string(&metrics_out).unwrap();
    let acc_pos = raw.find("accuracy").unwrap();
    let auc_pos = raw.find("roc_auc").unwrap();
    assert!(acc_pos < auc_pos);
}

#[test]
fn reloaded_model_predicts_identically() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_churn_csv(dir.path(), "churn.csv", 90);
    let params_path = write_params(
        dir.path(),
        "model:\n  type: RandomForestClassifier\n  n_estimators: 20\n  random_state: 42\n",
    );

    let model_out = dir.path().join("model.json");
    let metrics_out = dir.path().join("metrics.json");
    let mut trainer = Trainer::new(PipelineParams::load(&params_path).unwrap());
    trainer.run(&data, &model_out, &metrics_out).unwrap();

    let model = ChurnModel::load(&model_out).unwrap();
    assert_eq!(model.model_type, "RandomForestClassifier");

    let df = preprocess(load_csv(&data).unwrap()).unwrap();
    let x = select_features(&df, &model.feature_names).unwrap();

    let first = model.classifier.predict(&x).unwrap();
    let second = ChurnModel::load(&model_out)
        .unwrap()
        .classifier
        .predict(&x)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn identical_runs_write_identical_reports() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_churn_csv(dir.path(), "churn.csv", 90);
    let params_path = write_params(
        dir.path(),
        "split:\n  random_state: 7\nmodel:\n  type: DecisionTreeClassifier\n\
         metrics:\n  - accuracy\n  - f1\n",
    );

    let run = |tag: &str| {
        let metrics_out = dir.path().join(format!("metrics-{}.json", tag));
        let mut trainer = Trainer::new(PipelineParams::load(&params_path).unwrap());
        trainer
            .run(
                &data,
                &dir.path().join(format!("model-{}.json", tag)),
                &metrics_out,
            )
            .unwrap();
        std::fs::read_to_string(metrics_out).unwrap()
    };

    assert_eq!(run("a"), run("b"));
}

#[test]
fn stratified_split_holds_for_imbalanced_data() {
    let dir = tempfile::tempdir().unwrap();
    // ~1/3 positive rate by construction
    let data = write_churn_csv(dir.path(), "churn.csv", 150);

    let df = preprocess(load_csv(&data).unwrap()).unwrap();
    let (x, y, _) = churnml::data::to_matrix(&df).unwrap();

    let config = churnml::pipeline::SplitConfig::default();
    let (_, _, y_train, y_test) = churnml::pipeline::train_test_split(&x, &y, &config).unwrap();

    let overall = y.iter().filter(|&&v| v > 0.5).count() as f64 / y.len() as f64;
    let train = y_train.iter().filter(|&&v| v > 0.5).count() as f64 / y_train.len() as f64;
    let test = y_test.iter().filter(|&&v| v > 0.5).count() as f64 / y_test.len() as f64;

    assert!((train - overall).abs() < 0.05, "train {}", train);
    assert!((test - overall).abs() < 0.05, "test {}", test);
}

#[test]
fn evaluate_end_to_end_writes_report_and_roc() {
    let dir = tempfile::tempdir().unwrap();
    let train_data = write_churn_csv(dir.path(), "train.csv", 120);
    let eval_data = write_churn_csv(dir.path(), "holdout.csv", 60);

    let model_out = dir.path().join("model.json");
    let mut trainer = Trainer::new(PipelineParams::default());
    trainer
        .run(&train_data, &model_out, &dir.path().join("train_metrics.json"))
        .unwrap();

    let metrics_out = dir.path().join("eval/metrics.json");
    let plot_out = dir.path().join("eval/roc.svg");
    let report = evaluate(&model_out, &eval_data, &metrics_out, &plot_out).unwrap();

    assert!(metrics_out.exists());
    assert!(plot_out.exists());
    for name in [
        MetricName::Accuracy,
        MetricName::Precision,
        MetricName::Recall,
        MetricName::F1,
        MetricName::RocAuc,
    ] {
        assert!(report.get(name).is_some(), "missing {}", name.as_str());
    }

    let svg = std::fs::read_to_string(&plot_out).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("polyline"));
}

#[test]
fn svc_pipeline_produces_probabilities() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_churn_csv(dir.path(), "churn.csv", 60);
    let params_path = write_params(
        dir.path(),
        "model:\n  type: SVC\n  kernel: rbf\n  C: 1.0\n\
         metrics:\n  - accuracy\n  - roc_auc\n",
    );

    let mut trainer = Trainer::new(PipelineParams::load(&params_path).unwrap());
    let report = trainer
        .run(
            &data,
            &dir.path().join("model.json"),
            &dir.path().join("metrics.json"),
        )
        .unwrap();

    // SVC is calibrated after fitting, so roc_auc must be computable
    assert!(report.get(MetricName::RocAuc).is_some());
}

#[test]
fn tracked_run_is_recorded() {
    use churnml::tracking::{ExperimentTracker, FileTracker};

    let dir = tempfile::tempdir().unwrap();
    let data = write_churn_csv(dir.path(), "churn.csv", 90);
    let track_dir = dir.path().join("runs");

    let tracker: Box<dyn ExperimentTracker> = Box::new(FileTracker::new(&track_dir).unwrap());
    let mut trainer = Trainer::new(PipelineParams::default()).with_tracker(tracker);
    trainer
        .run(
            &data,
            &dir.path().join("model.json"),
            &dir.path().join("metrics.json"),
        )
        .unwrap();

    let raw = std::fs::read_to_string(track_dir.join("runs.json")).unwrap();
    let runs: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let run = &runs.as_array().unwrap()[0];
    assert_eq!(run["name"], "train");
    assert!(run["params"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p[0] == "model_type"));
    assert!(!run["metrics"].as_array().unwrap().is_empty());
}
