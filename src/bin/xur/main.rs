//! XUR CLI - Tool for inspecting and re-encoding XUR files.

use std::env;
use std::path::PathBuf;
use std::process;

use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use xur::core::{SchemaSet, UiObject};
use xur::xur::{batch, magic_to_string, IArchive};

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut schema_path: Option<PathBuf> = env::var_os("XUR_SCHEMA").map(PathBuf::from);
    let mut filtered_args: Vec<&str> = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            "-s" | "--schema" => match iter.next() {
                Some(path) => schema_path = Some(PathBuf::from(path)),
                None => fail("--schema requires a file argument"),
            },
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let command = filtered_args[0];
    let files = &filtered_args[1..];
    if matches!(command, "h" | "help" | "-h" | "--help") {
        print_help();
        return;
    }

    let schema = load_schema(schema_path);
    match command {
        "info" | "i" => cmd_info(&schema, require_file(files, "info")),
        "tree" | "t" => cmd_tree(&schema, require_file(files, "tree")),
        "strings" | "str" => cmd_strings(&schema, require_file(files, "strings")),
        "vectors" | "vec" => cmd_vectors(&schema, require_file(files, "vectors")),
        "roundtrip" | "rt" => cmd_roundtrip(&schema, require_file(files, "roundtrip"), files.get(1).copied()),
        "check" | "c" => {
            if files.is_empty() {
                fail("missing file arguments\nUsage: xur check <file.xur>...");
            }
            cmd_check(&schema, files);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!();
            print_help();
            process::exit(1);
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_help() {
    println!("xur - XUR file toolkit");
    println!();
    println!("USAGE:");
    println!("    xur [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info      <file>             Show header, section table and object counts");
    println!("    t, tree      <file>             Show the object tree with properties");
    println!("    str, strings <file>             List the string table");
    println!("    vec, vectors <file>             List the vector pool");
    println!("    rt, roundtrip <in> [out]        Decode and re-encode, compare bytes");
    println!("    c, check     <file>...          Round-trip many files in parallel");
    println!("    h, help                         Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -s, --schema <file>  Class schema JSON (default: $XUR_SCHEMA)");
    println!("    -v, --verbose        Show debug output");
    println!("    -vv, --trace         Show trace output (very verbose)");
    println!("    -q, --quiet          Only show errors");
    println!();
    println!("EXAMPLES:");
    println!("    xur -s classes.json info menu.xur");
    println!("    xur -s classes.json tree menu.xur");
    println!("    xur -s classes.json roundtrip menu.xur out.xur");
    println!("    xur -s classes.json check skin/*.xur");
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn require_file<'a>(files: &[&'a str], command: &str) -> &'a str {
    match files.first() {
        Some(file) => *file,
        None => fail(&format!("missing file argument\nUsage: xur {} <file.xur>", command)),
    }
}

fn load_schema(path: Option<PathBuf>) -> SchemaSet {
    let Some(path) = path else {
        fail("no class schema given; use --schema <file> or set XUR_SCHEMA");
    };
    match SchemaSet::from_json_file(&path) {
        Ok(schema) => {
            debug!(path = %path.display(), classes = schema.len(), "loaded schema");
            schema
        }
        Err(e) => fail(&format!("failed to load schema {}: {}", path.display(), e)),
    }
}

fn open(schema: &SchemaSet, path: &str) -> IArchive {
    info!("Opening archive: {}", path);
    match IArchive::open(path, schema) {
        Ok(archive) => archive,
        Err(e) => fail(&format!("failed to open {}: {}", path, e)),
    }
}

fn cmd_info(schema: &SchemaSet, path: &str) {
    let archive = open(schema, path);
    let header = archive.header();

    println!("Archive: {}", path);
    println!("Version: {}", header.version);
    println!("Flags: {:#010X}", header.flags);
    println!("Tool version: {}", header.tool_version);
    println!("File size: {} bytes", header.file_size);
    println!();

    println!("Sections ({}):", archive.table().len());
    for entry in archive.table().entries() {
        println!("  {}  offset {:>8}  length {:>8}", magic_to_string(entry.magic), entry.offset, entry.length);
    }
    println!();

    if let Some(strings) = archive.strings() {
        println!("Strings: {}", strings.len());
    }
    if let Some(vectors) = archive.vectors() {
        println!("Vectors: {}", vectors.len());
    }
    if let Some(root) = archive.root() {
        let mut counts = Counts::default();
        count(root, &mut counts);
        println!("Objects: {}", counts.objects);
        println!("Properties: {}", counts.properties);
        println!("Named frames: {}", counts.named_frames);
        println!("Timelines: {} ({} keyframes)", counts.timelines, counts.keyframes);
    }
}

#[derive(Default)]
struct Counts {
    objects: usize,
    properties: usize,
    named_frames: usize,
    timelines: usize,
    keyframes: usize,
}

fn count(obj: &UiObject, counts: &mut Counts) {
    counts.objects += 1;
    counts.properties += obj.properties.len();
    counts.named_frames += obj.named_frames.len();
    counts.timelines += obj.timelines.len();
    counts.keyframes += obj.timelines.iter().map(|t| t.keyframes.len()).sum::<usize>();
    for child in &obj.children {
        count(child, counts);
    }
}

fn cmd_tree(schema: &SchemaSet, path: &str) {
    let archive = open(schema, path);
    println!("Archive: {}", path);
    println!();
    if let Some(root) = archive.root() {
        print_tree(root, 0);
    }
}

fn print_tree(obj: &UiObject, depth: usize) {
    let indent = "  ".repeat(depth);
    match obj.id() {
        Some(id) => println!("{}{} \"{}\"", indent, obj.class_name, id),
        None => println!("{}{}", indent, obj.class_name),
    }
    for prop in &obj.properties {
        println!("{}  .{} = {}", indent, prop.name(), prop.value);
    }
    for frame in &obj.named_frames {
        if frame.target.is_empty() {
            println!("{}  @{} {} {:?}", indent, frame.time, frame.name, frame.command);
        } else {
            println!("{}  @{} {} {:?} -> {}", indent, frame.time, frame.name, frame.command, frame.target);
        }
    }
    for timeline in &obj.timelines {
        println!("{}  ~{} ({} keyframes)", indent, timeline.element_name, timeline.keyframes.len());
    }
    for child in &obj.children {
        print_tree(child, depth + 1);
    }
}

fn cmd_strings(schema: &SchemaSet, path: &str) {
    let archive = open(schema, path);
    if let Some(strings) = archive.strings() {
        for (i, s) in strings.iter().enumerate() {
            println!("{:>5}  {:?}", i + 1, s);
        }
    }
}

fn cmd_vectors(schema: &SchemaSet, path: &str) {
    let archive = open(schema, path);
    match archive.vectors() {
        Some(vectors) => {
            for (i, v) in vectors.vectors().iter().enumerate() {
                println!("{:>5}  {}", i, v);
            }
        }
        None => println!("{} has no vector pool", archive.version()),
    }
}

fn cmd_roundtrip(schema: &SchemaSet, input: &str, output: Option<&str>) {
    let original = match std::fs::read(input) {
        Ok(data) => data,
        Err(e) => fail(&format!("failed to read {}: {}", input, e)),
    };
    let archive = match IArchive::from_bytes(&original, schema) {
        Ok(archive) => archive,
        Err(e) => fail(&format!("failed to decode {}: {}", input, e)),
    };
    let encoded = match archive.to_bytes(schema) {
        Ok(bytes) => bytes,
        Err(e) => fail(&format!("failed to encode {}: {}", input, e)),
    };

    if let Some(output) = output {
        if let Err(e) = std::fs::write(output, &encoded) {
            fail(&format!("failed to write {}: {}", output, e));
        }
        println!("Wrote {} ({} bytes)", output, encoded.len());
    }

    if encoded == original {
        println!("{}: identical ({} bytes)", input, encoded.len());
    } else {
        let first = encoded.iter().zip(&original).position(|(a, b)| a != b);
        println!(
            "{}: DIFFERENT (input {} bytes, output {} bytes, first difference at {})",
            input,
            original.len(),
            encoded.len(),
            first.map_or_else(|| "end".to_string(), |p| format!("{:#X}", p)),
        );
        process::exit(2);
    }
}

fn cmd_check(schema: &SchemaSet, files: &[&str]) {
    let results = batch::verify_roundtrip(files, schema);
    let mut failures = 0;
    for entry in &results {
        match &entry.result {
            Ok(true) => println!("ok        {}", entry.path.display()),
            Ok(false) => {
                failures += 1;
                println!("differs   {}", entry.path.display());
            }
            Err(e) => {
                failures += 1;
                println!("error     {}: {}", entry.path.display(), e);
            }
        }
    }
    println!();
    println!("{} files, {} failed", results.len(), failures);
    if failures > 0 {
        process::exit(2);
    }
}
