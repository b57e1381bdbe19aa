use std::process;

fn main() {
    match doc_xref_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("doc-xref error: {err:#}");
            process::exit(2);
        }
    }
}
