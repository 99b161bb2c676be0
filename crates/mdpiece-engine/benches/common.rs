// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with **some** content and a [link](https://example.com).\n\n- Bullet point\n- Another item\n- [ ] Open task\n- [x] Done task\n\n1. First\n2. Second\n\n> Quoted line\n> and another\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n$$\nx^2 + y^2\n$$\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_long_paragraph(words: usize) -> String {
    let mut content = String::new();
    for i in 0..words {
        if i > 0 {
            content.push(' ');
        }
        content.push_str(match i % 5 {
            0 => "*wrapping*",
            1 => "text",
            2 => "`code`",
            3 => "flows",
            _ => "onward",
        });
    }
    content
}
