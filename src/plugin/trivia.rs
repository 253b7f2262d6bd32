//! Trivia games played in text channels and direct messages.

use crate::{
    config,
    context::Context,
    event::{Event, EventHandled},
    helper::{MessageHelper, UserHelper, UserIdHelper},
    log_error, log_internal,
    logging::AsyncPrintColor,
    plugin::Plugin,
    trivia::{
        AnswerOutcome, Question, RoundAdvance, TriviaSession, TriviaSettings, Weights,
    },
};
use anyhow::{anyhow, Result};
use serenity::all::{ChannelId, CreateAttachment, CreateMessage, GuildId, Message};
use std::time::Duration;

/// Pictures are re-uploaded under a neutral name so that the file name cannot give the answer.
const PICTURE_FILENAME: &str = "unknown.png";

pub struct Trivia;

#[serenity::async_trait]
impl Plugin for Trivia {
    fn name(&self) -> &'static str {
        "trivia"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(
            [
                "trivia [rounds] [illustration_rate] [biography_rate] [ability_rate] \
                 - run a trivia game",
                "tanswer <answer> - answer the current trivia question",
                "tstop - stop the trivia (Manage Messages permission)",
                "tscoreboard - show the trivia scoreboard",
            ]
            .iter()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n"),
        )
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, cmd, args)) = event.bot_cmd(ctx).await else {
            return Ok(EventHandled::No);
        };

        match cmd {
            "trivia" => start(ctx, msg, &args).await,
            "tanswer" => answer(ctx, msg, &args).await,
            "tstop" => stop(ctx, msg).await,
            "tscoreboard" => scoreboard(ctx, msg).await,
            _ => Ok(EventHandled::No),
        }
    }
}

/// Read `[rounds] [illustration] [biography] [ability]`, falling back to the configured
/// defaults.  More rounds than `max_rounds` are refused.
fn parse_settings(args: &[&str], defaults: &config::Trivia) -> Result<TriviaSettings> {
    if args.len() > 4 {
        return Err(anyhow!("Too many arguments."));
    }

    let rounds = match args.first() {
        Some(arg) => arg
            .parse::<usize>()
            .map_err(|_| anyhow!("`{}` is not a valid number of rounds.", arg))?,
        None => defaults.default_rounds,
    };
    if rounds > defaults.max_rounds {
        return Err(anyhow!(
            "A trivia cannot have more than {} rounds.",
            defaults.max_rounds
        ));
    }

    let rate = |index: usize, default: f64| -> Result<f64> {
        match args.get(index) {
            Some(arg) => arg
                .parse::<f64>()
                .map_err(|_| anyhow!("`{}` is not a valid rate.", arg)),
            None => Ok(default),
        }
    };

    Ok(TriviaSettings {
        rounds,
        weights: Weights::new(
            rate(1, defaults.default_illustration_rate)?,
            rate(2, defaults.default_biography_rate)?,
            rate(3, defaults.default_ability_rate)?,
        ),
    })
}

async fn start(ctx: &Context<'_>, msg: &Message, args: &[&str]) -> Result<EventHandled> {
    let channel_id = msg.channel_id;
    if ctx.vstate.read().await.trivia.is_running(channel_id) {
        msg.reply(ctx.cache_http, "A trivia is already running here.")
            .await?;
        return Ok(EventHandled::Yes);
    }

    let defaults = ctx.cfg.read().await.trivia.clone();
    let settings = match parse_settings(args, &defaults) {
        Ok(settings) => settings,
        Err(e) => {
            msg.reply(ctx.cache_http, e.to_string()).await?;
            return Ok(EventHandled::Yes);
        }
    };

    let kind = msg.channel_kind(ctx).await?;
    let mut session = match TriviaSession::new(settings, kind, ctx.characters.clone()) {
        Ok(session) => session,
        Err(e) => {
            msg.reply(ctx.cache_http, e.to_string()).await?;
            return Ok(EventHandled::Yes);
        }
    };

    log_internal!(
        "Preparing a {} rounds trivia in \"{}\"",
        settings.rounds,
        channel_id.color(ctx.http).await
    );

    let (announced, prepared) = tokio::join!(
        channel_id.say(
            ctx.http,
            format!("{} rounds trivia is preparing. Be ready...", settings.rounds)
        ),
        session.start(),
    );
    announced?;
    if let Err(e) = prepared {
        msg.reply(ctx.cache_http, format!("Could not prepare the trivia: {}", e))
            .await?;
        return Err(e.into());
    }

    let installed = {
        let mut vstate = ctx.vstate.write().await;
        // Another trivia may have been started while this one was being prepared
        if vstate.trivia.is_running(channel_id) {
            None
        } else {
            let advance = session.advance_round();
            let id = vstate.trivia.replace(channel_id, session);
            Some((id, advance))
        }
    };

    let Some((id, advance)) = installed else {
        msg.reply(ctx.cache_http, "A trivia is already running here.")
            .await?;
        return Ok(EventHandled::Yes);
    };

    if let Err(e) = announce(ctx, channel_id, msg.guild_id, advance).await {
        // Nobody saw the first question: drop the game so that a new one can start
        ctx.vstate.write().await.trivia.remove_if(channel_id, id);
        return Err(e.context("Could not show the first trivia question"));
    }
    Ok(EventHandled::Yes)
}

async fn answer(ctx: &Context<'_>, msg: &Message, args: &[&str]) -> Result<EventHandled> {
    let channel_id = msg.channel_id;
    let answer = args.join(" ");
    if answer.is_empty() {
        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        msg.reply(ctx.cache_http, format!("Usage: {}tanswer <answer>", prefix))
            .await?;
        return Ok(EventHandled::Yes);
    }

    let played = {
        let mut vstate = ctx.vstate.write().await;
        let id = vstate.trivia.id(channel_id);
        match (id, vstate.trivia.get_mut(channel_id)) {
            (Some(id), Some(session)) if session.is_running() => {
                let outcome = session.submit_answer(msg.author.id, &answer);
                Some((id, outcome, session.is_last_round(), session.display_round()))
            }
            _ => None,
        }
    };

    let Some((id, outcome, last_round, display_round)) = played else {
        msg.reply(ctx.cache_http, "No trivia playing here...").await?;
        return Ok(EventHandled::Yes);
    };

    let (expected, character, score) = match outcome {
        AnswerOutcome::NotStarted => {
            channel_id
                .say(ctx.http, "The game hasn't started yet :wink:")
                .await?;
            return Ok(EventHandled::Yes);
        }
        AnswerOutcome::RoundOver => {
            channel_id
                .say(ctx.http, "The round has ended, be quicker next time :confused:")
                .await?;
            return Ok(EventHandled::Yes);
        }
        AnswerOutcome::Wrong => {
            channel_id
                .say(ctx.http, ":frowning: Bad answer... Try again!")
                .await?;
            return Ok(EventHandled::Yes);
        }
        AnswerOutcome::Correct {
            expected,
            character,
            score,
        } => (expected, character, score),
    };

    let (site_url, delay) = {
        let cfg = ctx.cfg.read().await;
        (
            cfg.urban_rivals.site_url.clone(),
            cfg.trivia.next_round_delay_seconds,
        )
    };
    // Failed messages must not keep the next round from starting
    let player = msg.author.nick_in_guild(ctx, msg.guild_id).await;
    if let Err(e) = channel_id
        .say(
            ctx.http,
            format!(
                ":thumbsup: You're right! The character was **{}**!\n\
                 {} won **1** point. Their score is now {}!\n{}{}",
                expected, player, score, site_url, character.url
            ),
        )
        .await
    {
        log_error!("Could not announce the round winner: {}", e);
    }

    if let Err(e) = show_scoreboard(ctx, channel_id, msg.guild_id).await {
        log_error!("Could not show the trivia scoreboard: {:#}", e);
    }

    if !last_round {
        if let Err(e) = channel_id
            .say(
                ctx.http,
                format!(
                    "Next question in {} seconds... (round **{}**)",
                    delay,
                    display_round + 1
                ),
            )
            .await
        {
            log_error!("Could not announce the next round: {}", e);
        }
        tokio::time::sleep(Duration::from_secs(delay)).await;
    }

    // The trivia may have been stopped or replaced in the meantime
    let advance = match ctx.vstate.write().await.trivia.get_if(channel_id, id) {
        Some(session) => session.advance_round(),
        None => RoundAdvance::Inactive,
    };
    let asked = matches!(advance, RoundAdvance::Question(_));

    if let Err(e) = announce(ctx, channel_id, msg.guild_id, advance).await {
        if asked {
            // Nobody can answer a question that was never shown
            if let Some(session) = ctx.vstate.write().await.trivia.get_if(channel_id, id) {
                session.stop();
            }
            log_internal!(
                "Trivia stopped in \"{}\": the question could not be shown",
                channel_id.color(ctx.http).await
            );
        }
        return Err(e);
    }

    Ok(EventHandled::Yes)
}

async fn stop(ctx: &Context<'_>, msg: &Message) -> Result<EventHandled> {
    if !msg.is_from_owner(ctx).await && !msg.can_manage_messages(ctx).await? {
        msg.reply(
            ctx.cache_http,
            "You need the Manage Messages permission to stop a trivia.",
        )
        .await?;
        return Ok(EventHandled::Yes);
    }

    let response = match ctx.vstate.write().await.trivia.get_mut(msg.channel_id) {
        Some(session) if session.is_running() => {
            session.stop();
            "Trivia successfully stopped."
        }
        Some(_) => "Trivia already finished.",
        None => "No trivia playing here...",
    };

    msg.reply(ctx.cache_http, response).await?;
    Ok(EventHandled::Yes)
}

async fn scoreboard(ctx: &Context<'_>, msg: &Message) -> Result<EventHandled> {
    if ctx.vstate.read().await.trivia.get(msg.channel_id).is_none() {
        msg.reply(ctx.cache_http, "No trivia was played here...")
            .await?;
        return Ok(EventHandled::Yes);
    }

    show_scoreboard(ctx, msg.channel_id, msg.guild_id).await?;
    Ok(EventHandled::Yes)
}

/// Tell the channel about a new round, or about the end of the game.
async fn announce(
    ctx: &Context<'_>,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
    advance: RoundAdvance,
) -> Result<()> {
    match advance {
        RoundAdvance::Question(question) => send_question(ctx, channel_id, &question).await,
        RoundAdvance::Finished(summary) => {
            let winner_name = match summary.winner {
                Some((winner_id, _)) => winner_id.nick_in_guild(ctx, guild_id).await,
                None => String::new(),
            };
            channel_id
                .say(ctx.http, summary.message(&winner_name))
                .await?;
            log_internal!("Trivia over in \"{}\"", channel_id.color(ctx.http).await);
            Ok(())
        }
        RoundAdvance::Inactive => Ok(()),
    }
}

async fn send_question(
    ctx: &Context<'_>,
    channel_id: ChannelId,
    question: &Question,
) -> Result<()> {
    let mut message = CreateMessage::new().content(&question.text);

    if let Some(url) = &question.picture {
        let picture = reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        message = message.add_file(CreateAttachment::bytes(picture.to_vec(), PICTURE_FILENAME));
    }

    channel_id.send_message(ctx.cache_http, message).await?;
    Ok(())
}

async fn show_scoreboard(
    ctx: &Context<'_>,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
) -> Result<()> {
    let ranked = match ctx.vstate.read().await.trivia.get(channel_id) {
        Some(session) => session.scoreboard().ranked(),
        None => return Ok(()),
    };

    let mut entries = Vec::new();
    for (player, score) in ranked {
        entries.push((player.nick_in_guild(ctx, guild_id).await, score));
    }

    channel_id
        .say(ctx.http, scoreboard_message(&entries))
        .await?;
    Ok(())
}

fn scoreboard_message(entries: &[(String, u32)]) -> String {
    if entries.is_empty() {
        return "No player has scored any point so far.".to_owned();
    }

    let mut message = String::from("**SCOREBOARD:**\n");
    for (index, (name, score)) in entries.iter().enumerate() {
        message.push_str(&format!(
            "**{}**: **{}** (**{}** point{})\n",
            index + 1,
            name,
            score,
            if *score > 1 { "s" } else { "" }
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_fall_back_to_defaults() {
        let defaults = config::Trivia::default();

        let settings = parse_settings(&[], &defaults).unwrap();
        assert_eq!(settings.rounds, 10);
        assert_eq!(settings.weights, Weights::new(33.0, 33.0, 33.0));

        let settings = parse_settings(&["3", "100"], &defaults).unwrap();
        assert_eq!(settings.rounds, 3);
        assert_eq!(settings.weights, Weights::new(100.0, 33.0, 33.0));

        let settings = parse_settings(&["5", "0", "0", "1.5"], &defaults).unwrap();
        assert_eq!(settings.weights, Weights::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn bad_settings_are_rejected() {
        let defaults = config::Trivia::default();

        assert!(parse_settings(&["ten"], &defaults).is_err());
        assert!(parse_settings(&["-1"], &defaults).is_err());
        assert!(parse_settings(&["5", "lots"], &defaults).is_err());
        assert!(parse_settings(&["1", "2", "3", "4", "5"], &defaults).is_err());
        assert!(parse_settings(&["18446744073709551615"], &defaults).is_err());
    }

    #[test]
    fn rounds_are_capped() {
        let defaults = config::Trivia {
            max_rounds: 50,
            ..Default::default()
        };

        assert_eq!(parse_settings(&["50"], &defaults).unwrap().rounds, 50);
        let e = parse_settings(&["51"], &defaults).unwrap_err();
        assert_eq!(e.to_string(), "A trivia cannot have more than 50 rounds.");
        assert!(parse_settings(&["18446744073709551615"], &defaults).is_err());
    }

    #[test]
    fn scoreboard_lists_players_by_rank() {
        assert_eq!(
            scoreboard_message(&[]),
            "No player has scored any point so far."
        );

        let entries = [("Ambre".to_owned(), 3), ("Eyrton".to_owned(), 1)];
        assert_eq!(
            scoreboard_message(&entries),
            "**SCOREBOARD:**\n\
             **1**: **Ambre** (**3** points)\n\
             **2**: **Eyrton** (**1** point)\n"
        );
    }
}
