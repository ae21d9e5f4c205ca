use std::{env, fs, path::Path};

use tbs_compiler::{generators::generator_for, parse, GeneratorConfig, Language};

fn main() {
    let schema = Path::new("schema/commands.tsp");
    println!("cargo:rerun-if-changed={}", schema.display());

    let text = fs::read_to_string(schema).expect("failed to read schema/commands.tsp");
    let ir = match parse(&text, "commands.tsp") {
        Ok(ir) => ir,
        Err(e) => panic!("schema/commands.tsp: {}", e),
    };

    let files = generator_for(Language::Rust, &GeneratorConfig::default()).generate(&ir);
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("protocol.rs"), &files[0].content).expect("failed to write protocol.rs");
}
