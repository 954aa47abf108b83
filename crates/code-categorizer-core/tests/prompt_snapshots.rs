use code_categorizer_core::{ClassificationPrompt, Taxonomy};
use insta::assert_snapshot;

#[test]
fn surgical_prompt_snapshot() {
    let prompt = ClassificationPrompt::new("99213", Taxonomy::Surgical);
    assert_snapshot!("surgical_prompt", prompt.user);
}

#[test]
fn site_of_care_prompt_snapshot() {
    let prompt = ClassificationPrompt::new("99213", Taxonomy::SiteOfCare);
    assert_snapshot!("site_of_care_prompt", prompt.user);
}
