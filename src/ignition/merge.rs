use super::{convert, Config, ConvertError};
use crate::diagnostics::Report;

/// Append the config converted from `additional` to `base`
///
/// An empty fragment leaves `base` untouched. The fragment is converted with
/// the caller's strictness; its report follows `base_report`.
pub fn merge(
    base: Config,
    base_report: Report,
    additional: &str,
    strict: bool,
) -> Result<(Config, Report), ConvertError> {
    if additional.trim().is_empty() {
        return Ok((base, base_report));
    }

    let (extra, extra_report) = convert(additional, strict)?;
    let mut report = base_report;
    report.merge(extra_report);
    Ok((base.append(extra), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(config: &Config) -> Vec<&str> {
        config.files().iter().map(|f| f.path()).collect()
    }

    fn base() -> Config {
        convert(
            "storage:\n  files:\n  - path: /a\n    mode: 0644\n  - path: /b\n    mode: 0600\n",
            true,
        )
        .expect("base should convert")
        .0
    }

    #[test]
    fn test_empty_fragment_keeps_base() {
        let (merged, report) = merge(base(), Report::new(), "", true).expect("merge");
        assert_eq!(merged, base());
        assert!(report.is_empty());
    }

    #[test]
    fn test_files_are_appended_in_order() {
        let extra = "storage:\n  files:\n  - path: /c\n    mode: 0644\n  - path: /a\n    mode: 0644\n";
        let (merged, _) = merge(base(), Report::new(), extra, true).expect("merge");
        assert_eq!(paths(&merged), vec!["/a", "/b", "/c", "/a"]);
    }

    #[test]
    fn test_units_and_users_are_appended() {
        let extra = "systemd:\n  units:\n  - name: extra.service\npasswd:\n  users:\n  - name: core\n";
        let (merged, _) = merge(base(), Report::new(), extra, false).expect("merge");
        assert_eq!(merged.units()[0].name(), "extra.service");
        assert_eq!(merged.users()[0].name(), "core");
    }

    #[test]
    fn test_strictness_applies_to_fragment() {
        let extra = "storage:\n  files:\n  - path: /c\n";
        assert!(merge(base(), Report::new(), extra, true).is_err());
        let (_, report) = merge(base(), Report::new(), extra, false).expect("lenient merge");
        assert_eq!(report.len(), 1);
    }
}
