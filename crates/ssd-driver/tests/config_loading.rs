//! Configuration files shipped with the repository

use ssd_driver::{software_pass, AcceleratorConfig, ClassifierConfig, CompletionWait};
use std::path::PathBuf;

fn shipped(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
}

#[test]
fn reference_toml_matches_built_in_reference() {
    let loaded = ClassifierConfig::load(&shipped("reference.toml")).unwrap();
    let built_in = ClassifierConfig::reference();

    assert_eq!(loaded.templates(), built_in.templates());
    assert_eq!(loaded.vector(), built_in.vector());
    assert_eq!(
        loaded.accelerator(),
        &AcceleratorConfig {
            device: Some(PathBuf::from("/dev/mem")),
            ..AcceleratorConfig::default()
        }
    );
    assert_eq!(loaded.accelerator().wait(), CompletionWait::Unbounded);
}

#[test]
fn reference_toml_classifies_to_modelo_j() {
    let config = ClassifierConfig::load(&shipped("reference.toml")).unwrap();
    let result = software_pass(config.vector(), config.templates(), |_| {}).unwrap();
    assert_eq!(result.label(), "MODELO_J");
    assert_eq!(result.distance().get(), 259);
}

#[test]
fn too_many_templates_rejected() {
    let mut doc = String::from("vector = [0]\n");
    for i in 0..17 {
        doc.push_str(&format!("[[template]]\nlabel = \"t{i}\"\nsamples = [{i}]\n"));
    }
    assert!(ClassifierConfig::from_toml_str(&doc).is_err());
}

#[test]
fn vectors_longer_than_the_index_field_rejected() {
    let doc = "vector = [1, 2, 3, 4]\n[[template]]\nlabel = \"a\"\nsamples = [1, 2, 3, 4]\n";
    assert!(ClassifierConfig::from_toml_str(doc).is_err());
}
