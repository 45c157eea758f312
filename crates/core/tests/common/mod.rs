#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use neoghidra_core::model::{AnalysisResult, Function, Instruction, Symbol};
use neoghidra_core::project::NeoConfig;
use neoghidra_core::Address;

pub fn insn(addr: u64, bytes: &str, mnemonic: &str, operands: &str) -> Instruction {
    Instruction {
        address: Address(addr),
        bytes: bytes.into(),
        mnemonic: mnemonic.into(),
        operands: operands.into(),
        comment: None,
    }
}

pub fn func(name: &str, addr: u64, signature: &str) -> Function {
    Function {
        name: name.into(),
        entry_point: Address(addr),
        signature: signature.into(),
        code: None,
        body: None,
    }
}

pub fn sym(name: &str, addr: u64, kind: &str) -> Symbol {
    Symbol { name: name.into(), address: Address(addr), kind: kind.into(), source: None }
}

/// A small x86-64 program: `main` calls `helper`, plus one data label.
pub fn sample_result() -> AnalysisResult {
    let mut main = func("main", 0x401000, "int main(void)");
    main.code = Some("int main(void)\n{\n  helper();\n  return 0;\n}".into());
    AnalysisResult {
        program_name: "hello".into(),
        entry_point: Address(0x401000),
        architecture: "x86:LE:64:default".into(),
        image_base: Address(0x400000),
        entry_function: Some(main.clone()),
        functions: vec![main, func("helper", 0x401020, "void helper(void)")],
        symbols: vec![
            sym("main", 0x401000, "Function"),
            sym("helper", 0x401020, "Function"),
            sym("g_counter", 0x404010, "Label"),
        ],
        disassembly: vec![
            insn(0x401000, "55", "PUSH", "RBP"),
            insn(0x401001, "4889e5", "MOV", "RBP,RSP"),
            insn(0x401004, "e817000000", "CALL", "0x00401020"),
            insn(0x401009, "b800000000", "MOV", "EAX,0x0"),
            insn(0x40100e, "5d", "POP", "RBP"),
            insn(0x40100f, "c3", "RET", ""),
            insn(0x401020, "ff0500300000", "INC", "dword ptr [g_counter]"),
            insn(0x401026, "c3", "RET", ""),
        ],
    }
}

/// Noisy analyzer output wrapping `payload` in sentinels.
pub fn wrap_payload(payload: &str) -> String {
    format!(
        "INFO  Using log config file: jar:file:/ghidra/log4j.xml\n\
         INFO  ANALYZING all memory and code: hello (HeadlessAnalyzer)\n\
         __NEOGHIDRA_JSON_START__\n{payload}\n__NEOGHIDRA_JSON_END__\n\
         INFO  REPORT: Post-analysis succeeded for file: hello (HeadlessAnalyzer)\n"
    )
}

/// Write an executable `/bin/sh` script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod script");
}

/// Fake analyzer that logs each invocation to `calls.log`, optionally sleeps,
/// then prints `payload.json` between sentinels. Extra stderr lines are echoed.
#[cfg(unix)]
pub fn fake_analyzer(dir: &Path, payload: &str, sleep_secs: u32, stderr: &[&str]) -> PathBuf {
    let payload_path = dir.join("payload.json");
    fs::write(&payload_path, payload).expect("write payload");
    let calls = dir.join("calls.log");
    let mut body = format!("echo \"$@\" >> '{}'\n", calls.display());
    if sleep_secs > 0 {
        body.push_str(&format!("sleep {sleep_secs}\n"));
    }
    body.push_str("echo 'INFO  ANALYZING all memory and code'\n");
    for line in stderr {
        body.push_str(&format!("echo '{line}' >&2\n"));
    }
    body.push_str("echo __NEOGHIDRA_JSON_START__\n");
    body.push_str(&format!("cat '{}'\n", payload_path.display()));
    body.push_str("echo __NEOGHIDRA_JSON_END__");
    let script = dir.join("analyzeHeadless");
    write_script(&script, &body);
    script
}

pub fn sample_payload() -> String {
    serde_json::to_string(&sample_result()).expect("serialize sample")
}

/// Number of times the fake analyzer in `dir` has run.
pub fn call_count(dir: &Path) -> usize {
    fs::read_to_string(dir.join("calls.log")).map(|s| s.lines().count()).unwrap_or(0)
}

/// A config that points at `analyzer` and keeps all project files under `dir`.
pub fn config_for(dir: &Path, analyzer: &Path) -> NeoConfig {
    NeoConfig {
        analyzer_path: Some(analyzer.to_path_buf()),
        project_dir: dir.join("projects"),
        timeout_secs: 30,
        ..NeoConfig::default()
    }
}

/// A dummy "binary" with an ELF header.
pub fn write_binary(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"\x7fELF\x02\x01\x01\x00fake").expect("write binary");
    path
}
