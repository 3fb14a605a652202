use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;

use bim::config::Config;
use bim::editor::Editor;
use bim::input::KeySource;
use bim::syntax::SYNTAXES;
use bim::terminal::Terminal;
use bim::theme::{Theme, THEME_NAMES};

#[derive(Parser)]
#[command(name = "bim", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Open the initial buffer read-only
    #[arg(short = 'R')]
    readonly: bool,

    /// Use an alternate rc file (default ~/.bimrc)
    #[arg(short = 'u', value_name = "PATH")]
    rcfile: Option<String>,

    /// Print a file to stdout with syntax highlighting
    #[arg(short = 'c', value_name = "FILE")]
    dump: Option<String>,

    /// Like -c, but with line numbers
    #[arg(short = 'C', value_name = "FILE")]
    dump_numbered: Option<String>,

    /// Disable a capability (noscroll, nomouse, nounicode, ...)
    #[arg(short = 'O', value_name = "NAME")]
    options: Vec<String>,

    /// Show version information and available highlighters
    #[arg(long)]
    version: bool,

    /// Show this help text
    #[arg(short = '?', long = "help")]
    help: bool,

    /// File to open, optionally with a :line suffix (- for stdin)
    file: Option<String>,
}

fn show_usage() {
    print!(
        "bim - Text editor\n\
         \n\
         usage: bim [options] [file]\n\
         \x20      bim [options] -- -\n\
         \n\
         \x20-R     open initial buffer read-only\n\
         \x20-O     set various options:\n\
         \x20       noscroll    disable terminal scrolling\n\
         \x20       noaltscreen disable alternate screen buffer\n\
         \x20       nomouse     disable mouse support\n\
         \x20       nounicode   disable unicode display\n\
         \x20       nobright    disable bright text\n\
         \x20       nohideshow  disable toggling cursor visibility\n\
         \x20       nosyntax    disable syntax highlighting on load\n\
         \x20       nohistory   disable undo/redo\n\
         \x20       notitle     disable title-setting escapes\n\
         \x20       nobce       disable background color erase\n\
         \x20-c,-C  print file to stdout with syntax highlighting\n\
         \x20       -C includes line numbers, -c does not\n\
         \x20-u     override bimrc file\n\
         \x20-?     show this help text\n\
         \x20--version show version information\n"
    );
}

fn show_version() {
    eprintln!("bim {}", env!("CARGO_PKG_VERSION"));
    let names: Vec<&str> = SYNTAXES.iter().map(|s| s.name()).collect();
    eprintln!(" Available syntax highlighters: {}", names.join(" "));
    eprintln!(" Available color themes: {}", THEME_NAMES.join(" "));
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            show_usage();
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if cli.help {
        show_usage();
        return Ok(());
    }

    let mut config = Config::default();
    config.detect_weird_terminals();
    config.initial_file_is_read_only = cli.readonly;
    if let Some(rc) = &cli.rcfile {
        config.bimrc_path = rc.clone();
    }
    for option in &cli.options {
        if let Err(unknown) = config.apply_option(option) {
            eprintln!("bim: unrecognized -O option: {unknown}");
            std::process::exit(1);
        }
    }

    let mut theme = Theme::ansi(&config);
    if let Some(requested) = config.load_bimrc() {
        if let Some(loaded) = Theme::by_name(&requested, &config) {
            theme = loaded;
        }
    }

    if cli.version {
        show_version();
        return Ok(());
    }

    // Dump modes: highlight to stdout and exit.
    if let Some((target, numbered)) = cli
        .dump_numbered
        .clone()
        .map(|f| (f, true))
        .or_else(|| cli.dump.clone().map(|f| (f, false)))
    {
        config.go_to_line = false;
        let term = Terminal::with_sink(&config, Box::new(std::io::stdout()));
        let input = KeySource::from_bytes(b"");
        let mut editor = Editor::with_parts(config, theme, term, input);
        editor.open_file(&target);
        editor.dump_buffer(numbered);
        return Ok(());
    }

    let stdin_is_buffer = cli.file.as_deref() == Some("-");
    let mut editor = Editor::attach(config, theme, stdin_is_buffer)?;
    editor.update_screen_size();

    match &cli.file {
        Some(file) => {
            editor.open_file(file);
            if editor.config.initial_file_is_read_only {
                editor.buf_mut().readonly = true;
            }
        }
        None => {
            let buffer = editor.new_buffer();
            let width = editor.config.term_width;
            editor.registry.push_active(buffer, width);
        }
    }
    editor.update_title();
    editor.redraw_all();
    editor.normal_mode();

    Ok(())
}
