use crate::model::{AnalysisResult, Instruction};
use crate::render::RenderedView;

/// Header plus one line per instruction, each anchored to its own address.
pub fn render(result: &AnalysisResult) -> RenderedView {
    let mut view = RenderedView::new();

    view.push(format!("; Program: {}", result.program_name));
    view.push(format!("; Architecture: {}", result.architecture));
    view.push(format!("; Entry Point: {}", result.entry_point));
    view.push(format!("; Image Base: {}", result.image_base));
    view.push(format!("; Instructions: {}", result.disassembly.len()));
    view.push("");

    if result.disassembly.is_empty() {
        view.push("; No instructions available");
    }
    for insn in &result.disassembly {
        view.push_anchored(format_instruction(insn), insn.address);
    }

    view
}

/// `address  bytes  mnemonic operands ; comment`, column aligned.
pub fn format_instruction(insn: &Instruction) -> String {
    let mut line = format!(
        "{:<11} {:<23} {:<7} {}",
        insn.address.to_string(),
        insn.bytes,
        insn.mnemonic,
        insn.operands
    );
    let trimmed = line.trim_end().len();
    line.truncate(trimmed);
    if let Some(comment) = &insn.comment {
        line.push_str("  ; ");
        line.push_str(comment);
    }
    line
}
