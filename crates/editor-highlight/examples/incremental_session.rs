use editor_highlight::AnnotatedDocument;
use editor_highlight_lang::LanguageRegistry;
use std::path::Path;

fn main() {
    let registry = LanguageRegistry::with_builtins();
    let mut doc = AnnotatedDocument::detect(
        &registry,
        Some(Path::new("greeter.rb")),
        r#"# A tiny greeter
class Greeter
  def initialize(name)
    @name = name
  end

  def greet
    puts "Hello, #{@name}!" if @name
  end
end
"#,
    )
    .expect("detect ruby");

    let len = doc.len_chars();
    for attr in doc.attributes_in_range(0..len, 4) {
        let text: String = doc.text().slice(attr.range.clone()).chars().collect();
        println!("{:?} {:?} {:?}", attr.range, attr.role, text);
    }

    // Open a string on line 3; everything after it turns into string text.
    let at = doc.text().line_to_char(3) + 4;
    doc.insert(at, "\"");
    doc.ensure_up_to_date(at..at + 1);
    println!("after edit: {:?}", doc.engine().last_scan_stats());

    // Close it again; rescanning stops once the old annotations agree.
    doc.delete(at..at + 1);
    doc.ensure_up_to_date(at..at + 1);
    println!("after undo: {:?}", doc.engine().last_scan_stats());
}
