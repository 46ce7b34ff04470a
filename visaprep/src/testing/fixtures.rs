//! Dataset, schema and configuration fixtures.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::path::Path;

/// File name the fixture schema expects for every split.
pub const VISA_FILE_NAME: &str = "Visadataset.csv";

/// Raw header of the visa dataset.
pub const VISA_RAW_HEADER: [&str; 12] = [
    "case_id",
    "continent",
    "education_of_employee",
    "has_job_experience",
    "requires_job_training",
    "no_of_employees",
    "yr_of_estab",
    "region_of_employment",
    "prevailing_wage",
    "unit_of_wage",
    "full_time_position",
    "case_status",
];

/// Schema of the ingested visa splits.
pub const VISA_SCHEMA_YAML: &str = r"FileName: Visadataset.csv
NumberofColumns: 11
ColumnNames:
  continent: category
  education_of_employee: category
  has_job_experience: category
  requires_job_training: category
  no_of_employees: int
  region_of_employment: category
  prevailing_wage: float
  unit_of_wage: category
  full_time_position: category
  case_status: int
  company_age: int
target_column: case_status
Numerical_columns:
  - prevailing_wage
Onehot_columns:
  - continent
  - unit_of_wage
  - region_of_employment
Oridnal_columns:
  - has_job_experience
  - requires_job_training
  - full_time_position
  - education_of_employee
Transformation_columns:
  - no_of_employees
  - company_age
";

const CONTINENTS: [&str; 4] = ["Asia", "Europe", "North America", "Africa"];
const EDUCATION: [&str; 4] = ["High School", "Bachelor's", "Master's", "Doctorate"];
const REGIONS: [&str; 4] = ["West", "Northeast", "South", "Midwest"];
const UNITS: [&str; 3] = ["Year", "Hour", "Week"];
const YES_NO: [&str; 2] = ["Y", "N"];

/// Generates a raw visa dataset of `n_rows` rows.
///
/// Roughly a third of the rows are `Denied`; denied rows get lower wages
/// so the classes are separable. Every 17th row has an empty wage.
#[must_use]
pub fn visa_raw_csv(n_rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut csv = VISA_RAW_HEADER.join(",");
    csv.push('\n');
    for i in 0..n_rows {
        let denied = rng.gen_bool(0.33);
        let wage = if i % 17 == 5 {
            String::new()
        } else if denied {
            format!("{:.2}", rng.gen_range(5_000.0..40_000.0))
        } else {
            format!("{:.2}", rng.gen_range(60_000.0..140_000.0))
        };
        let pick = |rng: &mut StdRng, options: &[&'static str]| {
            options.choose(rng).copied().unwrap_or_default()
        };
        let continent = pick(&mut rng, &CONTINENTS);
        let education = pick(&mut rng, &EDUCATION);
        let experience = pick(&mut rng, &YES_NO);
        let training = pick(&mut rng, &YES_NO);
        let region = pick(&mut rng, &REGIONS);
        let unit = pick(&mut rng, &UNITS);
        let full_time = pick(&mut rng, &YES_NO);
        let employees: i64 = rng.gen_range(10..50_000);
        let year: i64 = rng.gen_range(1850..2016);
        let status = if denied { "Denied" } else { "Certified" };
        let _ = writeln!(
            csv,
            "EZYV{i:05},{continent},{education},{experience},{training},{employees},{year},\
             {region},{wage},{unit},{full_time},{status}"
        );
    }
    csv
}

/// A configuration document laying out artifacts under `artifact_dir`.
#[must_use]
pub fn config_yaml(dataset_url: &str, schema_dir: &Path, artifact_dir: &Path) -> String {
    format!(
        "training_pipeline_config:
  pipeline_name: visa
  artifact_dir: {artifact}
data_ingestion_config:
  dataset_download_url: {dataset_url}
  raw_data_dir: raw_data
  ingested_train_dir: ingested/train
  ingested_test_dir: ingested/test
  test_size: 0.2
  random_state: 42
  current_year: 2024
data_validation_config:
  schema_dir: {schema}
  schema_file_name: schema.yaml
data_transformation_config:
  transformed_train_dir: transformed/train
  transformed_test_dir: transformed/test
  preprocessing_dir: preprocessed
  preprocessed_object_file_name: preprocessed.bin
  continuous_min_distinct: 25
  random_state: 42
",
        artifact = artifact_dir.display(),
        schema = schema_dir.display(),
    )
}
