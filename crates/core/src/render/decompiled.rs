use crate::model::AnalysisResult;
use crate::render::RenderedView;

/// Header, the entry function's decompiled C, then one summary line per other function.
pub fn render(result: &AnalysisResult) -> RenderedView {
    let mut view = RenderedView::new();

    view.push(format!("// Program: {}", result.program_name));
    view.push(format!("// Entry Point: {}", result.entry_point));
    view.push(format!("// Architecture: {}", result.architecture));
    view.push(format!("// Image Base: {}", result.image_base));
    view.push("");

    let entry = result
        .entry_function
        .as_ref()
        .and_then(|f| f.code.as_deref().filter(|c| !c.trim().is_empty()).map(|c| (f, c)));

    match entry {
        Some((function, code)) => {
            let mut lines = code.lines();
            if let Some(first) = lines.next() {
                view.push_anchored(first, function.entry_point);
            }
            for line in lines {
                view.push(line);
            }
        }
        None => {
            view.push_anchored("// No decompiled code available for the entry point", result.entry_point);
        }
    }

    let others: Vec<_> = result.functions.iter().filter(|f| !result.is_entry_function(f)).collect();
    view.push("");
    view.push(format!("// Functions ({})", others.len()));
    for function in others {
        let line = if function.signature.is_empty() {
            format!("// {} @ {}", function.name, function.entry_point)
        } else {
            format!("// {} @ {} : {}", function.name, function.entry_point, function.signature)
        };
        view.push_anchored(line, function.entry_point);
    }

    view
}
