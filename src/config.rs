//! Controller configuration: tick rate, motion threshold, lookup timing and frame names.
//!
//! With the `allow_filesystem` feature, configuration can be read from YAML:
//! ```yaml
//! controller:
//!   rate_hz: 100
//!   min_increment: 0.001
//!   lookup_wait_ms: 200
//!   max_transform_age_ms: 100
//!   base_frame: base_link
//!   ee_frame: ee_link
//! robot: ur5
//! ```
//! All controller keys are optional. `robot` is either a preset name (ur3, ur5, ur10, ur5e)
//! or an inline parameter block in the format of [`Parameters::from_yaml_file`].

use std::time::Duration;

use crate::motion_gate::DEFAULT_MIN_INCREMENT;
use crate::parameter_error::ParameterError;
use crate::parameters::ur_kinematics::Parameters;

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Ticks per second.
    pub rate_hz: f64,
    /// Position error (metres) below which the arm is considered arrived.
    pub min_increment: f64,
    /// How long a single transform lookup may wait.
    pub lookup_wait: Duration,
    /// Transforms older than this count as unavailable.
    pub max_transform_age: Duration,
    pub base_frame: String,
    pub ee_frame: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            rate_hz: 100.0,
            min_increment: DEFAULT_MIN_INCREMENT,
            lookup_wait: Duration::from_millis(200),
            max_transform_age: Duration::from_millis(100),
            base_frame: "base_link".to_string(),
            ee_frame: "ee_link".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Duration of one tick.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        // The period must also fit in a Duration.
        if !(self.rate_hz.is_finite() && self.rate_hz > 0.0)
            || Duration::try_from_secs_f64(1.0 / self.rate_hz).is_err()
        {
            return Err(ParameterError::InvalidValue(format!(
                "rate_hz must be positive (got {})", self.rate_hz
            )));
        }
        if !(self.min_increment.is_finite() && self.min_increment > 0.0) {
            return Err(ParameterError::InvalidValue(format!(
                "min_increment must be positive (got {})", self.min_increment
            )));
        }
        if self.base_frame.is_empty() || self.ee_frame.is_empty() {
            return Err(ParameterError::InvalidValue("frame names must not be empty".into()));
        }
        if self.base_frame == self.ee_frame {
            return Err(ParameterError::InvalidValue(format!(
                "base and end-effector frames are the same ({})", self.base_frame
            )));
        }
        Ok(())
    }
}

/// Everything needed to run the servo: the loop settings and the arm geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServoConfig {
    pub controller: ControllerConfig,
    pub robot: Parameters,
}

#[cfg(feature = "allow_filesystem")]
mod from_yaml {
    use std::path::Path;

    use yaml_rust2::Yaml;

    use super::*;
    use crate::parameters_from_file::{load_document, number};

    impl ServoConfig {
        pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
            let contents = std::fs::read_to_string(path)?;
            ServoConfig::from_yaml_str(&contents)
        }

        pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
            let document = load_document(contents)?;
            let controller = match &document["controller"] {
                Yaml::BadValue | Yaml::Null => ControllerConfig::default(),
                section => controller_from_yaml(section)?,
            };
            controller.validate()?;

            let robot = match &document["robot"] {
                Yaml::BadValue | Yaml::Null => Parameters::default(),
                Yaml::String(name) => Parameters::by_name(name).ok_or_else(|| {
                    ParameterError::InvalidValue(format!("unknown robot preset '{}'", name))
                })?,
                section => Parameters::from_yaml(section)?,
            };
            Ok(ServoConfig { controller, robot })
        }
    }

    fn controller_from_yaml(section: &Yaml) -> Result<ControllerConfig, ParameterError> {
        let defaults = ControllerConfig::default();
        let real = |key: &str, default: f64| -> Result<f64, ParameterError> {
            match &section[key] {
                Yaml::BadValue => Ok(default),
                value => number(value).ok_or_else(|| {
                    ParameterError::ParseError(format!("controller.{} must be a number", key))
                }),
            }
        };
        let millis = |key: &str, default: Duration| -> Result<Duration, ParameterError> {
            match &section[key] {
                Yaml::BadValue => Ok(default),
                value => match value.as_i64() {
                    Some(ms) if ms >= 0 => Ok(Duration::from_millis(ms as u64)),
                    _ => Err(ParameterError::ParseError(format!(
                        "controller.{} must be a non-negative integer", key
                    ))),
                },
            }
        };
        let name = |key: &str, default: String| -> Result<String, ParameterError> {
            match &section[key] {
                Yaml::BadValue => Ok(default),
                value => value.as_str().map(str::to_string).ok_or_else(|| {
                    ParameterError::ParseError(format!("controller.{} must be a string", key))
                }),
            }
        };

        Ok(ControllerConfig {
            rate_hz: real("rate_hz", defaults.rate_hz)?,
            min_increment: real("min_increment", defaults.min_increment)?,
            lookup_wait: millis("lookup_wait_ms", defaults.lookup_wait)?,
            max_transform_age: millis("max_transform_age_ms", defaults.max_transform_age)?,
            base_frame: name("base_frame", defaults.base_frame)?,
            ee_frame: name("ee_frame", defaults.ee_frame)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.period(), Duration::from_millis(10));
        assert_eq!(config.min_increment, 0.001);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = ControllerConfig::default();
        config.rate_hz = 0.0;
        assert!(matches!(config.validate(), Err(ParameterError::InvalidValue(_))));
        config.rate_hz = 1E-300;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.min_increment = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.ee_frame = config.base_frame.clone();
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "allow_filesystem")]
    #[test]
    fn test_partial_yaml() {
        let config = ServoConfig::from_yaml_str(
            "controller:\n  rate_hz: 50\n  lookup_wait_ms: 20\nrobot: ur10\n",
        ).unwrap();
        assert_eq!(config.controller.rate_hz, 50.0);
        assert_eq!(config.controller.lookup_wait, Duration::from_millis(20));
        assert_eq!(config.controller.max_transform_age, Duration::from_millis(100));
        assert_eq!(config.controller.ee_frame, "ee_link");
        assert_eq!(config.robot, Parameters::ur10());
    }

    #[cfg(feature = "allow_filesystem")]
    #[test]
    fn test_unknown_preset() {
        let result = ServoConfig::from_yaml_str("robot: ur42\n");
        assert!(matches!(result, Err(ParameterError::InvalidValue(_))));
    }
}
