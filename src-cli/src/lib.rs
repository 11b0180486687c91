mod commands;
mod events;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use fir_core::domain::types::{ActiveTab, Language};
use fir_core::infra::config;
use fir_core::usecase::app_service::AppService;

#[derive(Parser, Debug)]
#[command(name = "fir-cli")]
#[command(version, about = "Draft First Information Reports with the FIR generation service")]
pub struct Cli {
    /// 設定ファイル（既定: <config dir>/fir-desk/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// FIRサービスのベースURL（設定ファイル / FIR_API_URL より優先）
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// 結果を JSON で出力する
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// サービスの状態を確認する
    Health,
    /// 説明文のリアルタイム解析プレビューを表示する
    Analyze { text: String },
    /// 音声ファイルを書き起こす
    Transcribe { file: PathBuf },
    /// FIRを生成する
    Generate(GenerateArgs),
    /// マイクから録音して書き起こす
    #[cfg(feature = "microphone")]
    Record {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
}

#[derive(Args, Debug)]
pub(crate) struct GenerateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub contact: String,
    /// 事件の説明（`--description-file` と併用不可）
    #[arg(long, conflicts_with = "description_file")]
    pub description: Option<String>,
    #[arg(long)]
    pub description_file: Option<PathBuf>,
    #[arg(long)]
    pub witness_name: Option<String>,
    #[arg(long)]
    pub witness_contact: Option<String>,
    /// 証拠ファイル（複数指定可、指定時は multipart 送信）
    #[arg(long = "evidence")]
    pub evidence: Vec<PathBuf>,
    /// 先に書き起こして説明文へ追記する音声ファイル
    #[arg(long)]
    pub audio: Option<PathBuf>,
    #[arg(long, value_parser = parse_language)]
    pub language: Option<Language>,
    /// 生成後にこの言語へ切り替えて再生成する
    #[arg(long, value_parser = parse_language)]
    pub regenerate_in: Option<Language>,
    /// 表示するタブ（document / entities / legal）
    #[arg(long, value_parser = parse_tab, default_value = "document")]
    pub tab: ActiveTab,
    /// PDF の出力先ディレクトリ（値なしで既定の出力先）
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub export: Option<PathBuf>,
    /// 印刷用HTMLを書き出す
    #[arg(long)]
    pub print: bool,
    /// 本文をクリップボードへコピーする
    #[arg(long)]
    pub copy: bool,
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse()
}

fn parse_tab(s: &str) -> Result<ActiveTab, String> {
    s.parse()
}

pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> commands::CmdResult<()> {
    let mut settings = config::load_settings(cli.config.as_deref())
        .map_err(fir_core::domain::error::AppError::from)?;
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
    }
    if let Command::Generate(args) = &cli.command {
        if let Some(language) = args.language {
            settings.language = language;
        }
    }

    let app = AppService::with_defaults(settings)?;
    let listener = events::spawn_listener(app.subscribe());
    let out = commands::Output::new(cli.json);

    let result = match cli.command {
        Command::Health => commands::health(&app, &out).await,
        Command::Analyze { text } => commands::analyze(&app, &out, text).await,
        Command::Transcribe { file } => commands::transcribe(&app, &out, &file).await,
        Command::Generate(args) => commands::generate(&app, &out, args).await,
        #[cfg(feature = "microphone")]
        Command::Record { seconds } => commands::record(&app, &out, seconds).await,
    };

    drop(app);
    listener.abort();
    result
}
