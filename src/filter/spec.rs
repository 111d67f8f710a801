//! Textual grammar for user-supplied filter arguments (spec §4.1):
//! `<Name>[_<param>]`, with `,` separating list parameters, e.g.
//! `MaxSize_102400` or `ExcludeFilename_index.md,README.md`. Unknown
//! names fail with a typed `FilterSpec` error.

use super::{
    Extension, ExcludeFilename, ExcludeParent, ExcludeRegex, Filter, IncludeFilename,
    IncludeRegex, MaxSize, YamlHeader,
};
use crate::error::{Error, Result};

/// Parses one `<Name>[_<param>]` spec into a boxed [`Filter`].
pub fn parse(spec: &str) -> Result<Box<dyn Filter>> {
    let (name, param) = match spec.split_once('_') {
        Some((n, p)) => (n, Some(p)),
        None => (spec, None),
    };

    let require_param = |name: &str| -> Result<&str> {
        param.ok_or_else(|| Error::FilterSpec {
            spec: spec.to_string(),
            reason: format!("{name} requires a parameter"),
        })
    };

    match name {
        "Extension" => Ok(Box::new(Extension::new(require_param(name)?))),
        "MaxSize" => {
            let raw = require_param(name)?;
            let bytes: u64 = raw.parse().map_err(|_| Error::FilterSpec {
                spec: spec.to_string(),
                reason: format!("{raw:?} is not a valid byte count"),
            })?;
            Ok(Box::new(MaxSize::new(bytes)))
        }
        "ExcludeFilename" => {
            let raw = require_param(name)?;
            Ok(Box::new(ExcludeFilename::new(split_list(raw))))
        }
        "IncludeFilename" => {
            let raw = require_param(name)?;
            Ok(Box::new(IncludeFilename::new(split_list(raw))))
        }
        "ExcludeParent" => Ok(Box::new(ExcludeParent::new(require_param(name)?))),
        "IncludeRegex" => {
            let raw = require_param(name)?;
            IncludeRegex::new(raw)
                .map(|f| Box::new(f) as Box<dyn Filter>)
                .map_err(|e| Error::FilterSpec { spec: spec.to_string(), reason: e.to_string() })
        }
        "ExcludeRegex" => {
            let raw = require_param(name)?;
            ExcludeRegex::new(raw)
                .map(|f| Box::new(f) as Box<dyn Filter>)
                .map_err(|e| Error::FilterSpec { spec: spec.to_string(), reason: e.to_string() })
        }
        "YamlHeader" => Ok(Box::new(YamlHeader)),
        other => Err(Error::FilterSpec {
            spec: spec.to_string(),
            reason: format!("unknown filter {other:?}"),
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_max_size() {
        assert!(parse("MaxSize_102400").is_ok());
    }

    #[test]
    fn parses_list_param() {
        assert!(parse("ExcludeFilename_index.md,README.md").is_ok());
    }

    #[test]
    fn unknown_name_fails() {
        let err = parse("NotARealFilter_x").unwrap_err();
        assert!(matches!(err, Error::FilterSpec { .. }));
    }

    #[test]
    fn missing_param_fails() {
        assert!(parse("MaxSize").is_err());
    }
}
