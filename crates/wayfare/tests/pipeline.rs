//! End-to-end runs of the pipeline on small on-disk fixtures.

use polars::prelude::*;
use std::fs;
use std::path::Path;
use wayfare::output::read_checkpoint;
use wayfare::{PipelineConfig, PipelineError, Stage, run};

const TRAIN_USERS: &str = "\
id,date_account_created,timestamp_first_active,date_first_booking,gender,age,signup_method,signup_flow,language,affiliate_channel,affiliate_provider,first_affiliate_tracked,signup_app,first_device_type,first_browser,country_destination
u1,2010-06-28,20090319043255,2010-08-02,-unknown-,35,facebook,0,en,direct,direct,untracked,Web,Mac Desktop,Chrome,US
u2,2011-05-25,20090523174809,,FEMALE,101,basic,3,en,seo,google,untracked,Web,Windows Desktop,IE,NDF
";

const TEST_USERS: &str = "\
id,date_account_created,timestamp_first_active,date_first_booking,gender,age,signup_method,signup_flow,language,affiliate_channel,affiliate_provider,first_affiliate_tracked,signup_app,first_device_type,first_browser
u3,2014-07-01,20140701000006,,MALE,28,basic,0,fr,direct,direct,linked,iOS,iPhone,Mobile Safari
";

const SESSIONS: &str = "\
user_id,action,action_type,action_detail,device_type,secs_elapsed
u1,search,click,view_search_results,Mac Desktop,10
u1,search,click,view_search_results,Mac Desktop,20
u1,show,view,p3,Mac Desktop,5
u1,show,view,p3,Mac Desktop,
u1,search,-unknown-,view_search_results,iPhone,1
u3,show,view,p3,iPhone,7
ghost,show,view,p3,iPhone,2
";

fn write_fixture(raw: &Path, sessions: &str) {
    fs::write(raw.join("train_users.csv"), TRAIN_USERS).unwrap();
    fs::write(raw.join("test_users.csv"), TEST_USERS).unwrap();
    fs::write(raw.join("sessions.csv"), sessions).unwrap();
}

fn config(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::with_dirs(root.join("raw"), root.join("processed"));
    config.threads = Some(2);
    config
}

fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[test]
fn test_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("raw")).unwrap();
    write_fixture(&dir.path().join("raw"), SESSIONS);
    let config = config(dir.path());

    let report = run(&config, None).unwrap();
    assert_eq!(report.users, 3);
    assert_eq!(report.session_events, 7);
    assert_eq!(report.session_users, 3);
    assert_eq!(report.threads, 2);
    assert_eq!(report.processed.total_rows(), 3);
    assert_eq!(report.encoded.total_rows(), 3);

    let out = &config.processed_dir;
    let train = read_checkpoint(&out.join("processed_train_users.csv")).unwrap();
    let test = read_checkpoint(&out.join("processed_test_users.csv")).unwrap();
    assert_eq!(train.height(), 2);
    assert_eq!(test.height(), 1);
    assert_eq!(names(&train)[0], "id");
    assert!(train.column("date_first_booking").is_err());
    assert!(test.column("country_destination").is_err());

    // u1 then u2 (no sessions); same-field values sum per column.
    assert_eq!(f64_values(&train, "session_length"), vec![Some(5.0), Some(0.0)]);
    assert_eq!(
        f64_values(&train, "search_secs_elapsed"),
        vec![Some(31.0), Some(0.0)]
    );
    assert_eq!(
        f64_values(&train, "Mac Desktop_secs_elapsed"),
        vec![Some(35.0), Some(0.0)]
    );
    assert_eq!(f64_values(&train, "click_secs_elapsed"), vec![Some(30.0), Some(0.0)]);
    assert_eq!(f64_values(&train, "action_type_count"), vec![Some(4.0), Some(0.0)]);
    assert_eq!(f64_values(&train, "secs_elapsed_count"), vec![Some(4.0), Some(0.0)]);
    assert_eq!(f64_values(&train, "secs_elapsed_sum"), vec![Some(36.0), None]);
    assert_eq!(f64_values(&train, "secs_elapsed_mean"), vec![Some(9.0), None]);
    assert_eq!(train.column("most_used_device").unwrap().null_count(), 1);
    assert_eq!(f64_values(&train, "age"), vec![Some(35.0), None]);

    // The orphan session user never reaches the output.
    assert!(
        train
            .column("id")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .all(|id| id != Some("ghost"))
    );

    // One session: no spread.
    assert_eq!(f64_values(&test, "session_length"), vec![Some(1.0)]);
    assert_eq!(f64_values(&test, "show_secs_elapsed"), vec![Some(7.0)]);
    assert_eq!(f64_values(&test, "search_secs_elapsed"), vec![Some(0.0)]);
    assert_eq!(test.column("secs_elapsed_var").unwrap().null_count(), 1);

    let encoded_train = read_checkpoint(&out.join("encoded_train_users.csv")).unwrap();
    let encoded_test = read_checkpoint(&out.join("encoded_test_users.csv")).unwrap();
    let train_columns: Vec<String> = names(&encoded_train)
        .into_iter()
        .filter(|name| name != "country_destination")
        .collect();
    assert_eq!(train_columns, names(&encoded_test));
    assert!(encoded_train.column("gender").is_err());
    assert!(encoded_train.column("date_account_created").is_err());
    assert!(encoded_train.column("timestamp_first_active").is_err());

    // Seen only among hold-out users, still a train column.
    assert_eq!(
        f64_values(&encoded_train, "language_fr"),
        vec![Some(0.0), Some(0.0)]
    );
    assert_eq!(f64_values(&encoded_test, "language_fr"), vec![Some(1.0)]);
    assert_eq!(
        f64_values(&encoded_train, "most_used_device_Mac Desktop"),
        vec![Some(1.0), Some(0.0)]
    );
    // Sentinel gender on u1 encodes as all zeros.
    assert_eq!(f64_values(&encoded_train, "gender_FEMALE"), vec![Some(0.0), Some(1.0)]);
    assert_eq!(f64_values(&encoded_train, "gender_MALE"), vec![Some(0.0), Some(0.0)]);

    assert!(out.join("processed_schema.json").exists());
    assert!(out.join("encoded_schema.json").exists());
    assert!(report.encoded.schemas_match("country_destination"));
}

#[test]
fn test_missing_input_fails_in_load_stage() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("raw")).unwrap();
    fs::write(dir.path().join("raw/train_users.csv"), TRAIN_USERS).unwrap();

    let err = run(&config(dir.path()), None).unwrap_err();
    assert_eq!(err.stage(), Stage::Load);
    assert!(!dir.path().join("processed").exists());
}

#[test]
fn test_negative_elapsed_fails_in_aggregate_stage() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("raw")).unwrap();
    let sessions = format!("{SESSIONS}u3,show,view,p3,iPhone,-4\n");
    write_fixture(&dir.path().join("raw"), &sessions);

    let err = run(&config(dir.path()), None).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Features {
            stage: Stage::Aggregate,
            ..
        }
    ));
    assert!(err.to_string().contains("u3"));
}
