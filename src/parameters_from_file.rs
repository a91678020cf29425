//! Supports extracting UR parameters from YAML file (optional)

use std::path::Path;

use regex::Regex;
use yaml_rust2::{Yaml, YamlLoader};

use crate::parameter_error::ParameterError;
use crate::parameters::ur_kinematics::Parameters;

impl Parameters {
    /// Read the robot configuration from YAML file. YAML file like this is supported:
    /// ```yaml
    /// # UR5 (CB3)
    /// ur_kinematics_dh_parameters:
    ///   d1: 0.089159
    ///   a2: -0.425
    ///   a3: -0.39225
    ///   d4: 0.10915
    ///   d5: 0.09465
    ///   d6: 0.0823
    /// ur_kinematics_joint_offsets: [0.0, 0.0, 0.0, 0.0, 0.0, deg(180.0)]
    /// ur_kinematics_joint_sign_corrections: [1, 1, 1, 1, 1, 1]
    /// ```
    /// Offsets and sign corrections are optional. Offsets may use deg(angle).
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        let document = load_document(&contents)?;
        Parameters::from_yaml(&document)
    }

    /// Parameters from an already parsed YAML document (or a section of it).
    pub fn from_yaml(document: &Yaml) -> Result<Self, ParameterError> {
        let dh = &document["ur_kinematics_dh_parameters"];
        if dh.is_badvalue() {
            return Err(ParameterError::MissingField("ur_kinematics_dh_parameters".into()));
        }
        let length = |name: &str| -> Result<f64, ParameterError> {
            let value = number(&dh[name])
                .ok_or_else(|| ParameterError::MissingField(format!("ur_kinematics_dh_parameters.{}", name)))?;
            if !value.is_finite() {
                return Err(ParameterError::ParseError(format!(
                    "geometric parameter '{}' must be finite (got {})", name, value
                )));
            }
            Ok(value)
        };

        let offsets = match &document["ur_kinematics_joint_offsets"] {
            Yaml::BadValue => [0.0; 6],
            value => six(value, angle, "ur_kinematics_joint_offsets")?,
        };
        let sign_corrections = match &document["ur_kinematics_joint_sign_corrections"] {
            Yaml::BadValue => [1; 6],
            value => six(value, sign, "ur_kinematics_joint_sign_corrections")?,
        };

        Ok(Parameters {
            d1: length("d1")?,
            a2: length("a2")?,
            a3: length("a3")?,
            d4: length("d4")?,
            d5: length("d5")?,
            d6: length("d6")?,
            offsets,
            sign_corrections,
        })
    }
}

/// First document of the YAML text.
pub(crate) fn load_document(contents: &str) -> Result<Yaml, ParameterError> {
    let mut documents = YamlLoader::load_from_str(contents)
        .map_err(|e| ParameterError::ParseError(e.to_string()))?;
    if documents.is_empty() {
        return Err(ParameterError::ParseError("empty YAML document".into()));
    }
    Ok(documents.swap_remove(0))
}

/// Integer or real YAML scalar as f64.
pub(crate) fn number(value: &Yaml) -> Option<f64> {
    match value {
        Yaml::Real(_) => value.as_f64(),
        Yaml::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

/// Angle in radians, or in degrees if written as deg(angle).
pub(crate) fn angle(value: &Yaml) -> Result<f64, ParameterError> {
    if let Some(radians) = number(value) {
        return Ok(radians);
    }
    let text = value
        .as_str()
        .ok_or_else(|| ParameterError::WrongAngle(format!("{:?}", value)))?;
    parse_angle(text)
}

fn parse_angle(text: &str) -> Result<f64, ParameterError> {
    let re = Regex::new(r"^deg\(\s*(-?\d+(\.\d+)?)\s*\)$")
        .map_err(|_| ParameterError::ParseError("Invalid regex pattern".to_string()))?;

    if let Some(caps) = re.captures(text.trim()) {
        let degrees_str = caps
            .get(1)
            .ok_or(ParameterError::WrongAngle(format!("Bad representation: {}", text)))?
            .as_str();
        let degrees: f64 = degrees_str
            .parse()
            .map_err(|_| ParameterError::WrongAngle(text.to_string()))?;
        Ok(degrees.to_radians())
    } else {
        // Plain number in a string, radians
        text.trim()
            .parse()
            .map_err(|_| ParameterError::WrongAngle(text.to_string()))
    }
}

fn sign(value: &Yaml) -> Result<i8, ParameterError> {
    match value.as_i64() {
        Some(1) => Ok(1),
        Some(-1) => Ok(-1),
        _ => Err(ParameterError::ParseError(format!(
            "sign corrections must be -1 or 1 (got {:?})", value
        ))),
    }
}

/// Exactly six elements of a YAML list, converted one by one.
fn six<T: Copy + Default>(
    value: &Yaml,
    convert: fn(&Yaml) -> Result<T, ParameterError>,
    label: &str,
) -> Result<[T; 6], ParameterError> {
    let items = value
        .as_vec()
        .ok_or_else(|| ParameterError::ParseError(format!("{} must be a list", label)))?;
    if items.len() != 6 {
        return Err(ParameterError::InvalidLength { expected: 6, found: items.len() });
    }
    let mut out = [T::default(); 6];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = convert(item)?;
    }
    Ok(out)
}
