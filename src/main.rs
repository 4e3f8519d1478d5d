use anyhow::Context;
use clap::Parser;
use dialoguer::{Confirm, Input, Password, Select};
use lexdesk::api::{AnalyzeRequest, DraftRequest, ListQuery, ResearchRequest, Session};
use lexdesk::cli::{Cli, Commands};
use lexdesk::config::Config;
use lexdesk::error::LexdeskError;
use lexdesk::importer::{self, ImportOptions};
use lexdesk::suggest::{self, EngineSettings};
use lexdesk::{api::CompletionBackend, compose};
use lexdesk_common::{InputMode, SuggestionRequest};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = Config::load().context("設定の読み込みに失敗しました")?;

    match run(cli.command, config).await {
        Err(LexdeskError::Unauthorized) => {
            // 期限切れトークンは残さない
            let path = Config::config_path()?;
            let mut config = Config::load_from(&path)?;
            config.token = None;
            config.save_to(&path)?;
            Err(LexdeskError::Unauthorized.into())
        }
        other => Ok(other?),
    }
}

fn init_logger(verbose: bool) {
    let default = if verbose { "lexdesk=debug,lexdesk_common=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

async fn run(command: Commands, mut config: Config) -> lexdesk::error::Result<()> {
    match command {
        Commands::Login { email } => {
            let email = match email {
                Some(email) => email,
                None => Input::new().with_prompt("メールアドレス").interact_text()?,
            };
            let password = Password::new().with_prompt("パスワード").interact()?;

            let (session, response) = Session::login(&config, &email, &password).await?;
            config.token = Some(response.access_token);
            config.save()?;

            let name = response
                .user
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(email.as_str());
            println!("✔ ログインしました: {}", name);
            drop(session);
        }

        Commands::Logout => {
            if let Ok(session) = Session::from_config(&config) {
                session.end();
            }
            config.token = None;
            config.save()?;
            println!("✔ ログアウトしました");
        }

        Commands::Config { set_api_base, show } => {
            if let Some(base) = set_api_base {
                config.set_api_base(base)?;
                println!("✔ APIのベースURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  API: {}", config.api_base);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  デバウンス: {}ms（候補: {}ms）", config.debounce_ms, config.suggest_debounce_ms);
                println!("  最小文字数: {}", config.min_chars);
                println!("  プレビュー件数: {}", config.preview_limit);
                println!("  トークン: {}", if config.token.is_some() { "設定済み" } else { "未設定" });
            }
        }

        Commands::Import { entity, file, preview_limit, yes, dry_run, report } => {
            println!("📥 lexdesk - {} インポート\n", entity.plural_label());

            let options = ImportOptions {
                entity,
                file,
                preview_limit: preview_limit.unwrap_or(config.preview_limit),
                yes,
                dry_run,
                report,
                timeout: config.timeout(),
            };

            // ドライランは未ログインでも可
            let session = if dry_run {
                Session::new(&config.api_base, config.token.clone(), config.timeout())?
            } else {
                Session::from_config(&config)?
            };
            if importer::run_import(&session, &options).await?.is_some() {
                println!("\n✅ インポート完了");
            }
        }

        Commands::Complete { text, field_type, context } => {
            let session = Session::from_config(&config)?;
            let request = SuggestionRequest::new(text.as_str(), field_type, context);
            let completion = tokio::time::timeout(config.timeout(), session.complete(&request))
                .await
                .map_err(|_| LexdeskError::Timeout(config.timeout()))??;

            match suggest::completed_text(&text, &completion) {
                Some(value) => println!("{}", value),
                None => println!("(補完候補なし)"),
            }
        }

        Commands::Suggest { text, field_type, context } => {
            let session = Session::from_config(&config)?;
            let request = SuggestionRequest::new(text.as_str(), field_type, context);

            // 候補リストは短いデバウンスの後に取得
            tokio::time::sleep(Duration::from_millis(config.suggest_debounce_ms)).await;
            let items = suggest::fetch_suggestions(&session, &request, config.min_chars, config.timeout()).await?;

            if items.is_empty() {
                println!("(候補なし)");
            } else {
                let index = Select::new()
                    .with_prompt("候補を選択")
                    .items(&items)
                    .default(0)
                    .interact_opt()?;
                if let Some(index) = index {
                    println!("{}", items[index]);
                }
            }
        }

        Commands::Compose { field_type, context, multiline } => {
            let session = Arc::new(Session::from_config(&config)?);
            let mode = if multiline { InputMode::MultiLine } else { InputMode::SingleLine };
            let settings = EngineSettings::from_config(&config).with_mode(mode);

            println!("✍ lexdesk - 入力補完 ({})\n", field_type);
            let value = compose::run_compose(session, &field_type, &context, settings).await?;
            println!("\n最終的な値: {}", value);
        }

        Commands::List { resource, search, limit, offset, all } => {
            let session = Session::from_config(&config)?;
            let items = if all {
                session.list_all(resource, search, limit).await?
            } else {
                let page = session.list_page(resource, &ListQuery { search, limit, offset }).await?;
                if page.has_more() {
                    log::info!("次ページあり: --offset {}", page.next_offset());
                }
                page.items
            };

            println!("{}", serde_json::to_string_pretty(&items)?);
            eprintln!("{}件", items.len());
        }

        Commands::Get { resource, id } => {
            let session = Session::from_config(&config)?;
            let record = session.get_record(resource, &id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Delete { resource, id, yes } => {
            let session = Session::from_config(&config)?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("{} を削除しますか？", resource.item_path(&id)))
                    .default(false)
                    .interact()?;
            if confirmed {
                session.delete_record(resource, &id).await?;
                println!("✔ 削除しました");
            } else {
                println!("中止しました");
            }
        }

        Commands::Whoami => {
            let session = Session::from_config(&config)?;
            let user = session.me().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }

        Commands::Research { query, jurisdiction, area_of_law, no_case_law, no_statutes } => {
            let session = Session::from_config(&config)?;
            let request = ResearchRequest {
                query,
                jurisdiction,
                area_of_law,
                include_case_law: !no_case_law,
                include_statutes: !no_statutes,
            };
            let response = session.research(&request).await?;

            println!("{}\n", response.summary);
            for point in &response.key_points {
                println!("  • {}", point);
            }
            if !response.relevant_cases.is_empty() {
                println!("\n判例:");
                for case in &response.relevant_cases {
                    println!("  - {}", case);
                }
            }
            if !response.relevant_statutes.is_empty() {
                println!("\n法令:");
                for statute in &response.relevant_statutes {
                    println!("  - {}", statute);
                }
            }
            for rec in &response.recommendations {
                println!("→ {}", rec);
            }
            if !response.disclaimer.is_empty() {
                println!("\n{}", response.disclaimer);
            }
        }

        Commands::Summarize { file, text } => {
            let text = match (file, text) {
                (Some(path), _) => read_input(&path)?,
                (None, Some(text)) => text,
                (None, None) => return Err(LexdeskError::Config("ファイルまたはテキストを指定してください".into())),
            };
            let session = Session::from_config(&config)?;
            println!("{}", session.summarize(&text).await?);
        }

        Commands::Draft { doc_type, context, template_id, vars } => {
            let session = Session::from_config(&config)?;
            let request = DraftRequest {
                doc_type,
                context,
                template_id,
                variables: vars.into_iter().collect(),
            };
            let document = session.draft(&request).await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }

        Commands::Analyze { document_id, file } => {
            let content = file.as_deref().map(read_input).transpose()?;
            if document_id.is_none() && content.is_none() {
                return Err(LexdeskError::Config("--document-id または --file を指定してください".into()));
            }
            let session = Session::from_config(&config)?;
            let analysis = session.analyze(&AnalyzeRequest { document_id, content }).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }

        Commands::Autofill { form_type, fields, existing, context } => {
            let session = Session::from_config(&config)?;
            let existing: Map<String, Value> = existing.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
            let filled = session.autofill(&form_type, &fields, &existing, &context).await?;
            println!("{}", serde_json::to_string_pretty(&filled)?);
        }
    }

    Ok(())
}

fn read_input(path: &std::path::Path) -> lexdesk::error::Result<String> {
    if !path.exists() {
        return Err(LexdeskError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}
