use studio::Script;
use studio::stream::split_words;

#[test]
fn triggers_match_case_insensitively_in_order() {
    let script = Script::from_toml(
        r#"
        [[response]]
        triggers = ["Liability"]
        content = "first"

        [[response]]
        triggers = ["liability cap", ""]
        content = "second"
        "#,
    )
    .unwrap();
    assert_eq!(script.respond("What is the LIABILITY cap?").content, "first");
    assert_eq!(script.find("nothing here"), None);
}

#[test]
fn fallback_defaults_when_omitted() {
    let script = Script::from_toml("").unwrap();
    let reply = script.respond("anything");
    assert_eq!(reply.content, Script::default().fallback);
    assert!(reply.citations.is_empty());
}

#[test]
fn invalid_script_is_an_error() {
    assert!(Script::from_toml("[[response]]\ncontent = 3").is_err());
}

#[test]
fn split_words_preserves_content() {
    let content = "  Net 30\ndays,  then **late fees** [¹].";
    let chunks = split_words(content);
    assert_eq!(chunks.concat(), content);
    assert_eq!(chunks[0], "  Net ");
    assert_eq!(chunks[1], "30\n");
    assert!(split_words("").is_empty());
}
