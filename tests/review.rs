use pkgsmith::core::config::{Conventions, ReviewConfig, Severity};
use pkgsmith::generate::template_set::{DEFAULT_SET, TemplateSource};
use pkgsmith::generate::vcs::VersionControl;
use pkgsmith::generate::{NewPackageRequest, create_package};
use pkgsmith::review::roles::ROLE_FAILURE_RULE;
use pkgsmith::review::source::SourceFile;
use pkgsmith::review::{Reviewer, load_sources};
use std::fs;
use std::path::{Path, PathBuf};

fn review_one(path: &str, src: &str) -> pkgsmith::review::ReviewReport {
    Reviewer::new(&ReviewConfig::default()).review(&[SourceFile::new(path, src)])
}

fn rules(report: &pkgsmith::review::ReviewReport) -> Vec<&str> {
    report.violations.iter().map(|v| v.rule).collect()
}

/// A module that satisfies every role; each test adds one problem to it.
const CLEAN: &str = r#""""Orders service."""

import logging

logger = logging.getLogger(__name__)


class OrderService:
    """Creates orders."""

    def create(self, sku: str, quantity: int) -> dict:
        """Create an order."""
        logger.info("creating order")
        return {"sku": sku, "quantity": quantity}
"#;

#[test]
fn clean_module_passes() {
    let report = review_one("src/orders/services.py", CLEAN);
    assert!(report.violations.is_empty(), "{:?}", report.violations);
    assert!(report.passed);
}

#[test]
fn long_clean_file_reports_exactly_one_file_length() {
    let mut src = String::from(CLEAN);
    while src.lines().count() < 250 {
        src.push_str("# Padding comment line for the module.\n");
    }
    let report = review_one("src/orders/services.py", &src);
    assert_eq!(rules(&report), vec!["file-length"]);
    assert!(!report.passed);
}

#[test]
fn print_reports_one_console_output() {
    let src = CLEAN.replace("logger.info(\"creating order\")", "print(\"debug\")");
    let report = review_one("src/orders/services.py", &src);
    assert_eq!(rules(&report), vec!["console-output"]);
    assert_eq!(report.violations[0].severity, Severity::Error);
}

#[test]
fn hardcoded_key_fails_the_review() {
    let src = format!("{}\napi_key = \"sk-1234567890abcdefghijklmnop\"\n", CLEAN);
    let report = review_one("src/orders/services.py", &src);
    assert_eq!(rules(&report), vec!["hardcoded-secret"]);
    assert!(!report.passed);
    assert!(report.ensure_passed().is_err());
}

#[test]
fn todo_format_is_enforced_in_comments_only() {
    let bad = format!("{}# TODO: fix this\n", CLEAN);
    assert_eq!(rules(&review_one("src/orders/services.py", &bad)), vec!["todo-format"]);

    let good = format!("{}# TODO(owner): fix this\n", CLEAN);
    assert!(review_one("src/orders/services.py", &good).violations.is_empty());
}

#[test]
fn warnings_do_not_fail_the_review() {
    let src = CLEAN.replace("        \"\"\"Create an order.\"\"\"\n", "");
    let report = review_one("src/orders/services.py", &src);
    assert_eq!(rules(&report), vec!["missing-docstring"]);
    assert_eq!(report.warnings, 1);
    assert!(report.passed);
}

#[test]
fn severity_overrides_change_the_outcome() {
    let mut config = ReviewConfig::default();
    config.severity.insert("console-output".to_string(), Severity::Warning);
    let src = CLEAN.replace("logger.info(\"creating order\")", "print(\"debug\")");
    let report = Reviewer::new(&config).review(&[SourceFile::new("src/orders/services.py", src)]);
    assert!(report.passed);
    assert_eq!(report.warnings, 1);
}

#[test]
fn unparseable_file_is_a_role_failure_not_a_crash() {
    let broken = SourceFile::new("src/orders/broken.py", "x = \"\"\"never closed\n");
    let fine = SourceFile::new("src/orders/fine.py", CLEAN);
    let report = Reviewer::new(&ReviewConfig::default()).review(&[broken, fine]);
    assert!(!report.passed);
    assert!(report
        .violations
        .iter()
        .all(|v| v.rule == ROLE_FAILURE_RULE && v.path == PathBuf::from("src/orders/broken.py")));
    assert_eq!(report.files_scanned, 2);
}

#[test]
fn long_file_that_fails_to_lex_keeps_its_file_length() {
    let mut src: String = (0..250).map(|i| format!("LIMIT_{} = {}\n", i, i)).collect();
    src.push_str("def broken(a,\n");
    let report = review_one("src/orders/big.py", &src);
    let found: Vec<(&str, &str)> = report.violations.iter().map(|v| (v.role, v.rule)).collect();
    assert!(found.contains(&("structure", "file-length")), "{:?}", found);
    assert!(found.contains(&("structure", ROLE_FAILURE_RULE)), "{:?}", found);
}

#[test]
fn subscript_secret_fails_the_review() {
    let src = format!("{}\nsettings = {{}}\nsettings[\"password\"] = \"hunter22\"\n", CLEAN);
    let report = review_one("src/orders/services.py", &src);
    assert_eq!(rules(&report), vec!["hardcoded-secret"]);
}

#[test]
fn route_modules_need_an_openapi_document() {
    let tmp = tempfile::tempdir().unwrap();
    let pkg = tmp.path().join("orders");
    fs::create_dir_all(pkg.join("src/orders/api")).unwrap();
    fs::write(pkg.join("pyproject.toml"), "[project]\nname = \"orders\"\n").unwrap();
    fs::write(
        pkg.join("src/orders/api/routes.py"),
        "\"\"\"Routes.\"\"\"\n\nfrom fastapi import APIRouter\n\nrouter = APIRouter()\n",
    )
    .unwrap();

    let paths = vec![PathBuf::from("orders/src/orders/api/routes.py")];
    let reviewer = Reviewer::new(&ReviewConfig::default());
    let files = load_sources(tmp.path(), &paths, &["py".to_string()]).unwrap();
    assert_eq!(rules(&reviewer.review(&files)), vec!["missing-api-spec"]);

    fs::write(pkg.join("openapi.yaml"), "openapi: 3.1.0\n").unwrap();
    let files = load_sources(tmp.path(), &paths, &["py".to_string()]).unwrap();
    assert!(reviewer.review(&files).passed);
}

struct NoVcs;

impl VersionControl for NoVcs {
    fn init_repository(&self, _root: &Path) -> Result<(), pkgsmith::core::error::PkgsmithError> {
        Ok(())
    }

    fn register_remote(
        &self,
        _root: &Path,
        _owner: &str,
        _name: &str,
    ) -> Result<String, pkgsmith::core::error::PkgsmithError> {
        unreachable!()
    }
}

#[test]
fn generated_package_passes_its_own_review() {
    let tmp = tempfile::tempdir().unwrap();
    let request = NewPackageRequest {
        name: "billing-core".to_string(),
        description: "Billing domain services".to_string(),
        packages_dir: tmp.path().to_path_buf(),
        templates: TemplateSource::Embedded(DEFAULT_SET.to_string()),
        init_git: false,
        create_remote: false,
        github_user: "acme".to_string(),
        force: false,
        dry_run: false,
    };
    let conventions = Conventions::default();
    let outcome = create_package(&request, &conventions, &NoVcs).unwrap();

    let root = outcome.summary.root.clone();
    let files = load_sources(&root, &outcome.summary.written, &conventions.review.extensions).unwrap();
    assert!(files.len() >= 10);
    let report = Reviewer::new(&conventions.review).review(&files);
    assert!(report.violations.is_empty(), "{}", report.render_text(false));
}
