use assert_cmd::cargo::cargo_bin_cmd;

#[test]
fn test_clean_strips_markdown_from_stdin() {
    cargo_bin_cmd!("smartchat")
        .arg("clean")
        .write_stdin("# Title\n**bold** and *italic*\n\n\n[link](http://x)\n")
        .assert()
        .success()
        .stdout("Title\nbold and italic\n\nlink\n");
}

#[test]
fn test_clean_empty_input() {
    cargo_bin_cmd!("smartchat")
        .arg("clean")
        .write_stdin("")
        .assert()
        .success()
        .stdout("\n");
}
