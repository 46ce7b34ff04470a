//! Feature preprocessing, outlier capping and class rebalancing.

mod column_transformer;
mod encoder;
mod imputer;
mod outlier;
mod persist;
mod power;
mod resample;
mod scaler;
mod stage;

pub use column_transformer::{
    steps_for, ColumnTransformer, FittedColumnTransformer, FittedGroup, FittedStep, Step,
    GROUP_STEPS,
};
pub use encoder::{FittedOneHotEncoder, FittedOrdinalEncoder, UNKNOWN_ORDINAL};
pub use imputer::{median, most_frequent, FittedMedianImputer, FittedModeImputer};
pub use outlier::{cap, cap_columns, continuous_columns, quantile_lower, TukeyFences, IQR_FACTOR};
pub use persist::{
    decode_npy, encode_npy, load_numpy_array, load_object, save_numpy_array, save_object,
    sha256_hex,
};
pub use power::{fit_lambda, yeo_johnson, FittedPowerTransformer};
pub use resample::{class_counts, Resampled, SmoteEnn};
pub use scaler::FittedStandardScaler;
pub use stage::{DataTransformation, TransformationInput};
