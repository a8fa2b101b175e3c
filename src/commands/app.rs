//! The interactive page: sign in, pick dates and a duration, browse the
//! directory, search availability and send invites for grid slots.

use anyhow::Result;
use chosei_core::calendar::{SelectedRange, Viewport, VisibleMonth};
use chosei_core::directory::DirectorySearch;
use chosei_core::duration::MeetingDuration;
use chosei_core::invite::{FAILURE_MESSAGE, InviteComposer, ModalState, SUCCESS_DISMISS_AFTER};
use chosei_core::schedule::ScheduleGrid;
use chosei_graph::actions;
use chrono::{Datelike, Local};
use dialoguer::{Confirm, Input, MultiSelect, Select};
use owo_colors::OwoColorize;
use tracing::warn;

use super::{calendar, search, users};
use crate::context::{AppContext, load_schedule};
use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run() -> Result<()> {
    let mut ctx = AppContext::load()?;

    println!("{}\n", "ほぼ調整さん".bold());

    let account = match ctx.identity.account().cloned() {
        Some(account) => account,
        None => {
            let sign_in = Confirm::new()
                .with_prompt("Microsoft アカウントでログインしますか?")
                .default(true)
                .interact()?;
            if !sign_in {
                return Ok(());
            }
            ctx.identity.login().await?
        }
    };
    println!("{}\n", account.greeting().bold());

    // The range, duration and attendees are shown back to the user only.
    // Availability always comes from the schedule file or the demo grid.
    if let Some(range) = pick_range()? {
        println!("期間: {}\n", range.to_string().cyan());
    }

    let duration = pick_duration()?;
    println!("所要時間: {}\n", duration.label().cyan());

    let _attendees = pick_users(&mut ctx).await?;

    let start_search = Confirm::new()
        .with_prompt("空き時間を検索しますか?")
        .default(true)
        .interact()?;
    if !start_search {
        return Ok(());
    }

    let grid = load_schedule()?;
    search::search_availability().await;
    println!("{}\n", grid.render());

    compose_invites(&mut ctx, &grid).await
}

fn pick_range() -> Result<Option<SelectedRange>> {
    let viewport = Viewport::new();
    let (widget, selected) =
        calendar::mount_calendar(&viewport, VisibleMonth::current(), Local::now().date_naive());

    let actions = ["期間を選択", "前の月", "次の月", "次へ"];
    loop {
        println!("{}\n", widget.selector().render());

        let choice = Select::new()
            .with_prompt("カレンダー")
            .items(&actions)
            .default(0)
            .interact()?;

        match choice {
            0 => {
                let month = widget.selector().visible_month();
                let from: String = Input::new()
                    .with_prompt("開始日 (日 または YYYY-MM-DD)")
                    .interact_text()?;
                let to: String = Input::new()
                    .with_prompt("終了日 (日 または YYYY-MM-DD)")
                    .interact_text()?;

                match (
                    calendar::parse_day(&from, month),
                    calendar::parse_day(&to, month),
                ) {
                    (Some(from), Some(to)) => {
                        if let Err(e) = calendar::drag(&widget, &viewport, from, &[to]) {
                            println!("{}", e.to_string().red());
                        }
                    }
                    _ => println!("{}", "日付を読み取れませんでした".red()),
                }
            }
            1 => widget.prev_month(),
            2 => widget.next_month(),
            _ => return Ok(*selected.borrow()),
        }
    }
}

fn pick_duration() -> Result<MeetingDuration> {
    let labels: Vec<&str> = MeetingDuration::ALL.iter().map(|d| d.label()).collect();
    let default = MeetingDuration::ALL
        .iter()
        .position(|d| *d == MeetingDuration::default())
        .unwrap_or(0);

    let index = Select::new()
        .with_prompt("所要時間")
        .items(&labels)
        .default(default)
        .interact()?;

    Ok(MeetingDuration::ALL[index])
}

async fn pick_users(ctx: &mut AppContext) -> Result<DirectorySearch> {
    let mut search = match users::fetch_directory(ctx).await {
        Ok(search) => search,
        Err(message) => {
            println!("{}\n", message.red());
            return Ok(DirectorySearch::default());
        }
    };

    let query: String = Input::new()
        .with_prompt("ユーザー検索")
        .allow_empty(true)
        .interact_text()?;
    search.set_query(query);
    println!("{}\n", search.render());

    let candidates: Vec<(String, String)> = search
        .filtered()
        .into_iter()
        .map(|u| (u.id.clone(), format!("{} ({})", u.display_name, u.user_principal_name)))
        .collect();
    if candidates.is_empty() {
        return Ok(search);
    }

    let labels: Vec<&str> = candidates.iter().map(|(_, label)| label.as_str()).collect();
    let chosen = MultiSelect::new()
        .with_prompt("参加者を選択 (スペースで切り替え)")
        .items(&labels)
        .interact()?;

    for index in chosen {
        search.toggle(&candidates[index].0);
    }
    println!("{} 人を選択しました\n", search.selected_ids().len());

    Ok(search)
}

async fn compose_invites(ctx: &mut AppContext, grid: &ScheduleGrid) -> Result<()> {
    let mut composer = InviteComposer::new(grid.attendees.clone());
    let year = Local::now().year();

    let mut items: Vec<String> = grid.slots.iter().map(|s| s.window.to_string()).collect();
    items.push("終了".to_string());
    let default = grid
        .target
        .and_then(|target| grid.slots.iter().position(|s| s.window == target))
        .unwrap_or(0);

    loop {
        let index = Select::new()
            .with_prompt("会議依頼を送る時間帯")
            .items(&items)
            .default(default)
            .interact()?;
        let Some(slot) = grid.slots.get(index) else {
            return Ok(());
        };

        composer.open(slot.window);
        edit_invite(&mut composer)?;

        let send = Confirm::new()
            .with_prompt("会議依頼を送信しますか?")
            .default(true)
            .interact()?;
        if !send {
            composer.close();
            continue;
        }

        let invite = match composer.begin_submit(year, &ctx.config.time_zone) {
            Ok(invite) => invite,
            Err(e) => {
                warn!(error = %e, "Cannot build meeting invite");
                println!("{}\n", composer.error().unwrap_or(FAILURE_MESSAGE).red());
                composer.close();
                continue;
            }
        };
        let spinner = create_spinner("会議依頼を送信中...".to_string());
        let outcome = actions::send_invite(&mut ctx.identity, &ctx.graph, &invite).await;
        spinner.finish_and_clear();

        if let Err(e) = &outcome {
            warn!(error = %e, "Failed to send meeting invite");
        }
        composer.finish_submit(outcome.map(|_| ()));

        if let ModalState::Success { message } = composer.modal() {
            println!("{} {}\n", "✓".green(), message.green());
            tokio::time::sleep(SUCCESS_DISMISS_AFTER).await;
            composer.dismiss_success();
        } else if let Some(error) = composer.error() {
            println!("{}\n", error.red());
            composer.close();
        }
    }
}

fn edit_invite(composer: &mut InviteComposer) -> Result<()> {
    let subject: String = Input::new()
        .with_prompt("件名")
        .with_initial_text(composer.subject())
        .interact_text()?;
    let body: String = Input::new()
        .with_prompt("本文")
        .with_initial_text(composer.body())
        .interact_text()?;
    let location: String = Input::new()
        .with_prompt("場所")
        .with_initial_text(composer.location())
        .interact_text()?;

    composer.set_subject(subject);
    composer.set_body(body);
    composer.set_location(location);

    let labels: Vec<String> = composer
        .attendees()
        .iter()
        .map(|a| format!("{} <{}>", a.label(), a.email))
        .collect();
    let defaults: Vec<bool> = composer
        .attendees()
        .iter()
        .map(|a| composer.is_attendee_selected(&a.email))
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt("参加者 (スペースで切り替え)")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    let emails: Vec<String> = composer.attendees().iter().map(|a| a.email.clone()).collect();
    for (index, email) in emails.iter().enumerate() {
        if chosen.contains(&index) != composer.is_attendee_selected(email) {
            composer.toggle_attendee(email);
        }
    }

    Ok(())
}
