use patch_triage::classify::Classifier;
use patch_triage::classify::registry::ProfileRegistry;
use patch_triage::config::{ClassifierConfig, Config};
use patch_triage::parser::parse_diff;
use patch_triage::reconstruct::{
    PatchStats, reconstruct_patch, split_code_patch, split_test_patch,
};
use patch_triage::HunkCategory;

const GO_CHANGE: &str = r#"diff --git a/pkg/server/handler.go b/pkg/server/handler.go
index 0a1b2c3..4d5e6f7 100644
--- a/pkg/server/handler.go
+++ b/pkg/server/handler.go
@@ -12,6 +12,8 @@ func (h *Handler) ServeHTTP(w http.ResponseWriter, r *http.Request) {
 	if r.Method != http.MethodGet {
 		http.Error(w, "method not allowed", http.StatusMethodNotAllowed)
 		return
 	}
+	w.Header().Set("Cache-Control", "no-store")
+	w.Header().Set("X-Content-Type-Options", "nosniff")
 	h.render(w, r)
 }

diff --git a/pkg/server/handler_test.go b/pkg/server/handler_test.go
index 1111111..2222222 100644
--- a/pkg/server/handler_test.go
+++ b/pkg/server/handler_test.go
@@ -40,3 +40,12 @@ func TestServeGet(t *testing.T) {
 	}
 }

+func TestHeadersAreSet(t *testing.T) {
+	rec := httptest.NewRecorder()
+	h := &Handler{}
+	h.ServeHTTP(rec, httptest.NewRequest("GET", "/", nil))
+	if got := rec.Header().Get("Cache-Control"); got != "no-store" {
+		t.Errorf("Cache-Control = %q", got)
+	}
+}
+
diff --git a/docs/logo.svg b/docs/logo.svg
new file mode 100644
index 0000000..abcdef0
Binary files /dev/null and b/docs/logo.svg differ
diff --git a/cmd/old.go b/cmd/new.go
similarity index 100%
rename from cmd/old.go
rename to cmd/new.go
"#;

fn classifier_parts() -> (ProfileRegistry, ClassifierConfig) {
    (ProfileRegistry::builtin(), ClassifierConfig::default())
}

#[test]
fn full_reconstruction_is_identity() {
    let (registry, config) = classifier_parts();
    let mut files = parse_diff(GO_CHANGE);
    Classifier::new(&registry, &config).classify_all(&mut files, Some("golang"));
    assert_eq!(reconstruct_patch(&files, &HunkCategory::ALL, false), GO_CHANGE);
}

#[test]
fn test_and_code_patches_cover_everything_once() {
    let (registry, config) = classifier_parts();
    let classifier = Classifier::new(&registry, &config);

    let test_patch = split_test_patch(GO_CHANGE, Some("go"), &classifier, false);
    let code_patch = split_code_patch(GO_CHANGE, Some("go"), &classifier, false);

    assert!(test_patch.contains("func TestHeadersAreSet"));
    assert!(!test_patch.contains("handler.go b/pkg/server/handler.go"));
    assert!(!test_patch.contains("logo.svg"));

    assert!(code_patch.contains("nosniff"));
    assert!(code_patch.contains("Binary files /dev/null and b/docs/logo.svg differ"));
    assert!(code_patch.contains("rename to cmd/new.go"));
    assert!(!code_patch.contains("TestHeadersAreSet"));

    let reparsed_test = parse_diff(&test_patch);
    let reparsed_code = parse_diff(&code_patch);
    assert_eq!(reparsed_test.len() + reparsed_code.len(), parse_diff(GO_CHANGE).len());
}

#[test]
fn stats_without_hint_detect_language_per_file() {
    let (registry, config) = classifier_parts();
    let mut files = parse_diff(GO_CHANGE);
    Classifier::new(&registry, &config).classify_all(&mut files, None);

    let stats = PatchStats::collect(&files);
    assert_eq!(stats.total_files, 4);
    assert_eq!(stats.total_hunks, 2);
    assert_eq!(stats.test_hunks, 1);
    assert_eq!(stats.code_hunks, 1);
    assert_eq!(stats.test_only_files, 1);
    assert_eq!(stats.code_only_files, 1);
    assert_eq!(stats.binary_files, 1);
}

#[test]
fn weight_overrides_change_classification() {
    let config = Config::from_toml(
        r#"
[[classifier.weights]]
language = "go"
pattern = 'Header\(\)\.Set'
weight = 5.0
"#,
    )
    .unwrap();
    let registry = config.registry().unwrap();
    let classifier = Classifier::new(&registry, &config.classifier);

    let mut files = parse_diff(GO_CHANGE);
    classifier.classify_all(&mut files, Some("go"));
    let handler = &files[0].hunks[0];
    assert_ne!(handler.category, HunkCategory::Code);
}
