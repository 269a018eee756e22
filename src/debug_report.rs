use rulewalk::{Compiler, NodeFlags, NodeId, ParseResult, ParseTree, Script, TERMINAL, Walker};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Compiler that prints each node as the walker hands it over.
pub struct TracePrinter {
    palette: ansi::Palette,
}

impl TracePrinter {
    pub fn new(color: bool) -> Self {
        Self { palette: ansi::Palette::new(color) }
    }
}

impl Compiler for TracePrinter {
    /// Nodes seen so far.
    type Data = usize;

    fn trigger(&mut self, language: &str, node: NodeId, data: &mut usize, walker: &mut Walker) {
        *data += 1;
        let node = walker.node(node);
        let parent = node.parent().map(|p| p.name()).unwrap_or("-");
        println!(
            "  {} {} {} {} {}",
            self.palette.paint(format!("{:>4}", data), ansi::GRAY),
            self.palette.dim(language),
            self.palette.paint(node.name(), ansi::BLUE),
            self.palette.dim(format!("<- {parent}")),
            fmt_value(&node.value(), node.child_count() == 0, &self.palette)
        );
    }
}

pub fn print_trace_header(color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.paint("━━━ Walk (post-order) ━━━", ansi::GRAY));
}

pub fn print_run(script: &Script, rule: &str, result: &ParseResult, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Parsing {} ({} bytes)", rule, script.len()), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Tree ━━━", ansi::GRAY));
    print_tree(&result.tree, &palette);

    println!("\n{}", palette.paint("━━━ Result ━━━", ansi::GRAY));
    match result.syntax_error() {
        None => println!("  {}", palette.paint("✓ valid", ansi::GREEN)),
        Some(err) => {
            println!("  {} {}", palette.paint("✗", ansi::RED), palette.bold(err.to_string()));
            if let Some(line) = script.source().lines().nth(err.line.saturating_sub(1)) {
                println!("    {}", palette.dim(line));
                println!("    {}{}", " ".repeat(err.column), palette.paint("^", ansi::RED));
            }
        }
    }
    if !result.metrics.unresolved.is_empty() {
        println!(
            "  {} {}",
            palette.paint("unresolved rules:", ansi::YELLOW),
            result.metrics.unresolved.join(", ")
        );
    }

    let metrics = &result.metrics;
    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Evaluate: {}  │  Normalize: {}",
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        palette.paint(format!("{:?}", metrics.evaluate), ansi::CYAN),
        palette.dim(format!("{:?}", metrics.normalize)),
    );
    println!(
        "  {}",
        palette.dim(format!(
            "nodes: {}  evaluations: {}  alternations: {}  deepest: {}  spliced: {}",
            metrics.nodes_created,
            metrics.evaluations,
            metrics.alternations,
            metrics.deepest,
            metrics.normalized.spliced
        ))
    );
    println!();
}

/// One line per reachable node, indented by depth.
fn print_tree(tree: &ParseTree, palette: &ansi::Palette) {
    let mut stack = vec![(tree.root(), 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let node = tree.node(id);
        let data = node.data();
        let name = if data.is_transient() {
            palette.paint(node.name(), ansi::MAGENTA)
        } else if node.name() == TERMINAL {
            palette.paint(node.name(), ansi::YELLOW)
        } else if data.flags().contains(NodeFlags::MATCHED) {
            palette.paint(node.name(), ansi::BLUE)
        } else {
            palette.paint(node.name(), ansi::RED)
        };

        println!(
            "  {}{} {} {}",
            "  ".repeat(depth),
            name,
            palette.dim(format!("{}..{}", node.start(), node.end())),
            fmt_value(&node.value(), data.children().is_empty(), palette)
        );

        stack.extend(data.children().iter().rev().map(|&child| (child, depth + 1)));
    }
}

fn fmt_value(value: &str, leaf: bool, palette: &ansi::Palette) -> String {
    if value.is_empty() {
        return String::new();
    }
    let preview: String = format!("{value:?}").chars().take(60).collect();
    if leaf { palette.paint(preview, ansi::GREEN) } else { palette.dim(preview) }
}
