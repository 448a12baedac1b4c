mod actions;
mod commands;
mod paths;
mod settings;

use std::fs;
use std::fs::File;
use std::path::PathBuf;

use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;
use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use remote_table::TableController;
use remote_table::error::SourceError;
use remote_table::registry::ColumnDescriptor;
use remote_table::registry::FilterDescriptor;
use remote_table::source::HttpDataSource;
use remote_table::source::JsonRecord;
use remote_table::source::RecordKey;
use remote_table::view::text;

use actions::Backend;
use commands::Command;
use commands::HELP;
use commands::PageTarget;
use settings::ConfigError;
use settings::FilterKindSettings;
use settings::TableSettings;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("data source: {0}")]
    Source(#[from] SourceError),
    #[error("stdin: {0}")]
    Io(#[from] std::io::Error),
}

/// Log to `latest.log` in the cache dir; logging is skipped if the file
/// cannot be created.
fn init_logging() {
    paths::rotate_logs();
    let Some(path) = paths::log_file() else { return };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    match File::create(&path) {
        Ok(file) => {
            let _ = WriteLogger::init(LevelFilter::Debug, Config::default(), file);
        }
        Err(e) => eprintln!("logging disabled: cannot create {}: {}", path.display(), e),
    }
}

fn mount(settings: &TableSettings) -> Result<TableController<JsonRecord>, CliError> {
    let mut source = HttpDataSource::builder(settings.endpoint.clone())
        .id_field(settings.id_field.clone())
        .pagination(settings.pagination.into());
    if let Some(token) = &settings.bearer_token {
        source = source.bearer_token(token.clone());
    }
    if let Some(timeout) = settings.timeout() {
        source = source.timeout(timeout);
    }
    let source = source.build()?;

    let backend = Backend::new(
        &settings.endpoint,
        settings.bearer_token.clone(),
        settings.timeout(),
    )?;

    let columns: Vec<_> = settings
        .columns
        .iter()
        .map(|column| {
            let mut descriptor = ColumnDescriptor::new(column.field.clone(), column.label());
            if column.sortable {
                descriptor = descriptor.sortable();
            }
            if let Some(width) = column.width {
                descriptor = descriptor.width(width);
            }
            if !column.hideable {
                descriptor = descriptor.pinned();
            } else if column.hidden {
                descriptor = descriptor.hidden();
            }
            descriptor
        })
        .collect();

    let filters: Vec<_> = settings
        .filters
        .iter()
        .map(|filter| {
            let (field, label) = (filter.field.clone(), filter.label());
            match filter.kind {
                FilterKindSettings::Text => FilterDescriptor::text(field, label),
                FilterKindSettings::Date => FilterDescriptor::date(field, label),
                FilterKindSettings::DateRange => FilterDescriptor::date_range(field, label),
                FilterKindSettings::Select => match &filter.options_url {
                    Some(url) => {
                        let backend = backend.clone();
                        let url = url.clone();
                        FilterDescriptor::select_remote(field, label, move || {
                            let backend = backend.clone();
                            let url = url.clone();
                            async move { backend.options(&url).await }
                        })
                    }
                    None => FilterDescriptor::select(
                        field,
                        label,
                        filter.options.iter().cloned().map(Into::into),
                    ),
                },
            }
        })
        .collect();

    Ok(TableController::builder(source)
        .columns(columns)
        .filters(filters)
        .bulk_actions([actions::print_ids(), actions::delete(backend)])
        .config(settings.table_config())
        .session(|error: &remote_table::error::FetchError| {
            log::warn!("Authorization rejected: {}", error);
            eprintln!("authorization rejected ({error}); update bearer_token and restart");
        })
        .mount())
}

/// Apply one command. Returns `false` to quit.
fn apply(table: &TableController<JsonRecord>, command: Command) -> bool {
    match command {
        Command::Page(target) => {
            let page = table.query().page();
            table.set_page(match target {
                PageTarget::Number(n) => n,
                PageTarget::Next => page.saturating_add(1),
                PageTarget::Previous => page.saturating_sub(1),
            });
        }
        Command::Size(size) => table.set_page_size(size),
        Command::Sort(field) => table.set_sort(&field),
        Command::Filter { field, value } => {
            let kind = table
                .filters()
                .iter()
                .find(|filter| filter.field == field)
                .map(|filter| &filter.kind);
            match commands::filter_value(kind, &value) {
                Ok(value) => table.set_filter(&field, value),
                Err(e) => eprintln!("{e}"),
            }
        }
        Command::Unfilter(field) => table.set_filter(&field, ""),
        Command::Search(text) => table.set_search(&text),
        Command::Reset => table.reset_filters(),
        Command::Select(ids) => {
            for id in ids {
                table.toggle_row(RecordKey::new(id));
            }
        }
        Command::SelectAll => table.toggle_all_visible(),
        Command::ClearSelection => table.clear_selection(),
        Command::Column(field) => {
            if !table.toggle_column(&field) {
                eprintln!("column '{field}' cannot be hidden");
            }
        }
        Command::Refresh => table.refresh(),
        Command::Action(index) => {
            let table = table.clone();
            tokio::spawn(async move {
                if let Err(e) = table.run_bulk_action(index).await {
                    eprintln!("{e}");
                }
            });
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
    }
    true
}

async fn run(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let settings = TableSettings::load(config_path.as_deref())?;
    let table = mount(&settings)?;
    let mut changes = table.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", text::render(&table.view()));
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if !apply(&table, command) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{e}"),
                }
            }
            change = changes.recv() => {
                if change.is_none() {
                    break;
                }
                println!("{}", text::render(&table.view()));
            }
        }
    }

    table.unmount();
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    if let Err(e) = run(config_path).await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
