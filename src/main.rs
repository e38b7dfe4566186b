use anyhow::Result;
use aura::audio::VoiceCapture;
use aura::chat::{AssistantConfig, Orchestrator, SubmitOutcome};
use aura::conversation::{AvatarEmotion, ConversationStore, Sender};
use aura::llm::GeminiClient;
use aura::speech::default_synthesizer;
use aura::theme::{ThemePreference, ThemeStore};
use std::io::BufRead;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aura=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aura chat assistant");

    // The capture stream handle is not Send, so the binary owns the runtime
    // and drives async calls from the main thread.
    let runtime = Runtime::new()?;

    let config = AssistantConfig::from_env();
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let theme_store = ThemeStore::new();
    let store = ConversationStore::new();
    store.set_theme(theme_store.load());

    let generator = Arc::new(GeminiClient::new(config.llm.clone())?);
    let synthesizer = default_synthesizer();
    let orchestrator = Orchestrator::new(store.clone(), generator, synthesizer.clone())
        .with_voice(config.voice.clone())
        .with_context_replies(config.context_replies);
    let mut capture = VoiceCapture::new(store.clone());

    println!("aura ready - type a message, /help for commands");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/help" => print_help(),
            "/clear" => {
                orchestrator.clear();
                println!("(conversation cleared)");
            }
            "/voices" => {
                let voices = synthesizer.list_voices();
                if voices.is_empty() {
                    println!("(no voices available)");
                }
                for voice in voices {
                    println!("{} [{}]", voice.name, voice.language);
                }
            }
            "/voice" => {
                if capture.is_recording() {
                    match capture.stop_recording() {
                        Some(recording) => {
                            println!("(captured {:.1}s)", recording.duration.as_secs_f32());
                            runtime.block_on(orchestrator.submit_voice(recording));
                            print_reply(&store);
                        }
                        None => println!("(nothing captured)"),
                    }
                } else {
                    match capture.start_recording() {
                        Ok(()) => println!("(recording - /voice to stop, /cancel to discard)"),
                        Err(e) => println!("{}", e.user_message()),
                    }
                }
            }
            "/cancel" => {
                capture.cancel_recording();
                println!("(recording discarded)");
            }
            "/say" => {
                let last = store
                    .messages()
                    .into_iter()
                    .rev()
                    .find(|m| m.sender == Sender::Assistant && !m.is_typing);
                match last {
                    Some(message) => {
                        if let Err(e) = runtime.block_on(orchestrator.speak_message(message.id)) {
                            println!("{}", e.user_message());
                        }
                    }
                    None => println!("(nothing to say yet)"),
                }
            }
            _ if input.starts_with("/theme") => {
                match input.trim_start_matches("/theme").trim().parse::<ThemePreference>() {
                    Ok(theme) => {
                        store.set_theme(theme);
                        theme_store.save(theme);
                        println!("(theme: {theme})");
                    }
                    Err(_) => println!("usage: /theme <light|dark|system>"),
                }
            }
            _ if input.starts_with("/emotion") => {
                match input.trim_start_matches("/emotion").trim().parse::<AvatarEmotion>() {
                    Ok(emotion) => {
                        store.set_emotion(emotion);
                        println!("(avatar: {emotion})");
                    }
                    Err(_) => {
                        let names: Vec<String> =
                            AvatarEmotion::all().iter().map(|e| e.to_string()).collect();
                        println!("usage: /emotion <{}>", names.join("|"));
                    }
                }
            }
            _ if input.starts_with('/') => println!("(unknown command - /help)"),
            text => {
                let outcome = if config.streaming_replies {
                    runtime.block_on(orchestrator.submit_streaming(text, config.speak_replies))
                } else {
                    runtime.block_on(orchestrator.submit(text, config.speak_replies))
                };
                match outcome {
                    SubmitOutcome::Completed => print_reply(&store),
                    SubmitOutcome::EmptyInput => {}
                    SubmitOutcome::Busy => println!("(still thinking - try again in a moment)"),
                }
            }
        }
    }

    info!("Shutting down");
    Ok(())
}

fn print_reply(store: &ConversationStore) {
    if let Some(message) = store
        .messages()
        .into_iter()
        .rev()
        .find(|m| m.sender == Sender::Assistant && !m.is_typing)
    {
        println!("aura: {}", message.text);
    }
}

fn print_help() {
    println!("  <text>            send a message");
    println!("  /voice            start/stop voice recording");
    println!("  /cancel           discard an in-progress recording");
    println!("  /say              speak the last reply aloud");
    println!("  /voices           list synthesis voices");
    println!("  /theme <pref>     switch theme (light|dark|system)");
    println!("  /emotion <name>   preview an avatar emotion");
    println!("  /clear            clear the conversation");
    println!("  /quit             exit");
}
