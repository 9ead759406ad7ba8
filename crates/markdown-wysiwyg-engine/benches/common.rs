// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2

/// One section exercising every decorated construct.
const SECTION: &str = "## Section {n}\n\nParagraph with **bold**, *italic*, `code`, a [link](http://example.com) and <u>underline</u>.\n\n- bullet one\n- [ ] open task\n- [x] done task\n\n1. first\n2. second\n   1. nested\n\n> quoted text\n> over two lines\n\nInline math $a^2 + b^2$ and more.\n\n$$\n\\sum_{i=1}^{n} i\n$$\n\n| name | value |\n|------|------:|\n| a    | 1     |\n| b    | 2     |\n\n```rust\nfn example() {\n    let value = 42;\n    println!(\"{}\", value);\n}\n```\n\n![diagram](images/pic{n}.png)\n\n---\n\n";

#[allow(dead_code)]
pub fn generate_document(sections: usize) -> String {
    let mut content = String::from("# Benchmark document\n\n[toc]\n\n");
    for n in 0..sections {
        content.push_str(&SECTION.replace("{n}", &n.to_string()));
    }
    content
}

#[allow(dead_code)]
pub fn generate_large_document() -> String {
    generate_document(200)
}
