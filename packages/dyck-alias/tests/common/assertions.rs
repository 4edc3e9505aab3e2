//! Custom assertions for alias analysis results

use dyck_alias::{AliasAnalysis, ValueId};

/// Assert that two values share an equivalence class
pub fn assert_aliased(analysis: &AliasAnalysis<'_>, a: ValueId, b: ValueId) {
    let module = analysis.module();
    assert!(
        analysis.may_alias(a, b).expect("both values registered"),
        "expected {} and {} to alias; alias set of {}: {:?}",
        module.display_name(a),
        module.display_name(b),
        module.display_name(a),
        names(analysis, a),
    );
}

/// Assert that two values live in different classes
pub fn assert_not_aliased(analysis: &AliasAnalysis<'_>, a: ValueId, b: ValueId) {
    let module = analysis.module();
    assert!(
        !analysis.may_alias(a, b).expect("both values registered"),
        "expected {} and {} not to alias; shared set: {:?}",
        module.display_name(a),
        module.display_name(b),
        names(analysis, a),
    );
}

/// Display names of `value`'s alias set, for failure messages
pub fn names(analysis: &AliasAnalysis<'_>, value: ValueId) -> Vec<String> {
    let module = analysis.module();
    analysis
        .alias_set(value)
        .map(|set| set.iter().map(|&v| module.display_name(v)).collect())
        .unwrap_or_default()
}
