use crate::catalog::{Browser, FeatureCatalog};
use crate::target::Target;

/// List the built-in support targets and their thresholds
pub fn list_targets() {
    println!();
    println!("🌐 Basecheck — Built-in support targets");
    println!("{}", "━".repeat(55));
    println!();

    for target in Target::builtin() {
        println!("  🎯 {}", target.name);
        for browser in Browser::ALL {
            if let Some(minimum) = target.minimums.get(&browser) {
                println!("     {:<10} ≥ {}", browser.as_str(), minimum);
            }
        }
        println!();
    }

    println!("{}", "━".repeat(55));
    println!("  Run `basecheck scan . --target enterprise` to use one");
    println!("  Or set custom thresholds in .basecheck.toml");
    println!();
}

/// List every feature the catalog tracks
pub fn list_features(catalog: &FeatureCatalog) {
    println!();
    println!("🌐 Basecheck — Known web-platform features");
    println!("{}", "━".repeat(55));
    println!();

    if catalog.is_empty() {
        println!("  (catalog is empty)");
        println!();
        return;
    }

    for feature in catalog.features() {
        println!("  📋 {} ({})", feature.name, feature.id);
        if !feature.description.is_empty() {
            println!("     {}", feature.description);
        }
        let support: Vec<String> = feature
            .support
            .iter()
            .map(|(browser, version)| format!("{browser} {version}"))
            .collect();
        if !support.is_empty() {
            println!("     since: {}", support.join(", "));
        }
        println!();
    }

    println!("{}", "━".repeat(55));
    println!("  {} features loaded", catalog.len());
    println!();
    println!("  Run `basecheck scan .` to check your project");
    println!();
}
