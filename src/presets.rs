//! Built-in batch configurations.

use crate::config::{BatchConfig, RuleConfig};
use crate::transform::Template;

/// Names of the built-in presets.
pub const PRESETS: &[&str] = &["tenant-paths"];

/// Looks up a preset by name.
pub fn by_name(name: &str) -> Option<BatchConfig> {
    match name {
        "tenant-paths" => Some(tenant_paths()),
        _ => None,
    }
}

/// Moves Firestore service modules from a fixed `COLLECTION_NAME` constant to
/// tenant-scoped `paths.<collection>()` helpers.
pub fn tenant_paths() -> BatchConfig {
    const SERVICES: &[(&str, &str)] = &[
        ("noticesService.js", "notices"),
        ("servicesService.js", "services"),
        ("schemesService.js", "schemes"),
        ("formsService.js", "forms"),
        ("galleryService.js", "gallery"),
        ("villageStatisticsService.js", "villages"),
        ("financialService.js", "financials"),
        ("grievancesService.js", "grievances"),
        ("pagesService.js", "pages"),
    ];

    let mut config = BatchConfig::new("tenant-paths")
        .with_root("src/services")
        .rule(RuleConfig::InsertAfter {
            name: "paths-import".into(),
            anchor: "import { db } from '../config/firebaseConfig';".into(),
            line: Template::new("import paths from '../utils/firestorePaths';"),
            marker: None,
        })
        .rule(RuleConfig::Substitute {
            name: "collection-name".into(),
            symbol: "COLLECTION_NAME".into(),
            replacement: Template::new("paths.{param}()"),
            definition: Some(Template::new("// Multi-tenant: using paths.{param}()")),
            include_literals: false,
        });
    config.description = Some("Use tenant-specific Firestore paths in service modules".into());

    SERVICES
        .iter()
        .fold(config, |config, (file, collection)| config.target(*file, *collection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_paths_builds() {
        let config = tenant_paths();
        let (spec, targets) = config.build().unwrap();

        assert_eq!(spec.len(), 2);
        assert_eq!(targets.len(), 9);
        assert_eq!(targets[0].path.to_str(), Some("src/services/noticesService.js"));
        assert_eq!(targets[5].param, "villages");
    }

    #[test]
    fn test_lookup() {
        for name in PRESETS {
            assert!(by_name(name).is_some());
        }
        assert!(by_name("unknown").is_none());
    }
}
