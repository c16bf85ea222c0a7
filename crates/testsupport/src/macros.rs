//! Test setup macros.

/// Creates a [`TestContext`](crate::context::TestContext) with one relation.
///
/// # Syntax
///
/// ```text
/// test_db!(context_var, relation: "name", attrs: [spec, ...])
/// ```
///
/// # Example
///
/// ```
/// use catalog::AttrSpec;
/// use testsupport::test_db;
///
/// test_db!(ctx, relation: "users", attrs: [AttrSpec::integer("id"), AttrSpec::string("name", 16)]);
/// assert_eq!(ctx.db().relation_len("users").unwrap(), 0);
/// ```
#[macro_export]
macro_rules! test_db {
    (mut $ctx:ident, relation: $name:expr, attrs: [$($spec:expr),+ $(,)?]) => {
        let mut $ctx = $crate::context::TestContext::with_relations(&[($name, vec![$($spec),+])])
            .expect("failed to create test context");
    };
    ($ctx:ident, relation: $name:expr, attrs: [$($spec:expr),+ $(,)?]) => {
        let $ctx = $crate::context::TestContext::with_relations(&[($name, vec![$($spec),+])])
            .expect("failed to create test context");
    };
}
