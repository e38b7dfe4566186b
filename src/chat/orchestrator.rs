//! Conversation orchestrator: one submit -> respond (-> speak) round-trip.
//!
//! Generator failures never reach the caller; they degrade to a fixed
//! transcript entry. Synthesis failures are logged and absorbed.

use crate::audio::RecordingHandle;
use crate::conversation::{AvatarEmotion, ConversationStore, MessageDraft};
use crate::llm::{format_context_prompt, ResponseGenerator};
use crate::speech::{SpeechSynthesizer, VoiceOptions};
use crate::{AuraError, Result};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Transcript entry substituted when generation fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your request.";

/// Transcript text substituted for a captured voice message. Captured audio
/// is not transcribed; this stands in until a real speech-to-text path
/// exists.
pub const VOICE_MESSAGE_TEXT: &str = "This was a voice message";

/// Outcome of a submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The round-trip ran to completion (including the fallback path).
    Completed,
    /// Input was empty after trimming; nothing was appended.
    EmptyInput,
    /// Another round-trip is in flight; this submit was rejected.
    Busy,
}

/// Sequences conversation round-trips over the store and the external
/// generation/synthesis services.
pub struct Orchestrator {
    store: ConversationStore,
    generator: Arc<dyn ResponseGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice: VoiceOptions,
    context_replies: bool,
    in_flight: AtomicBool,
}

impl Orchestrator {
    pub fn new(
        store: ConversationStore,
        generator: Arc<dyn ResponseGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            store,
            generator,
            synthesizer,
            voice: VoiceOptions::default(),
            context_replies: false,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_voice(mut self, voice: VoiceOptions) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_context_replies(mut self, enabled: bool) -> Self {
        self.context_replies = enabled;
        self
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run one round-trip for the text, optionally speaking the reply.
    pub async fn submit(&self, text: &str, speak: bool) -> SubmitOutcome {
        self.round_trip(text, None, speak, false).await
    }

    /// Like `submit`, but merges streaming fragments into the placeholder
    /// as they arrive.
    pub async fn submit_streaming(&self, text: &str, speak: bool) -> SubmitOutcome {
        self.round_trip(text, None, speak, true).await
    }

    /// Submit a completed voice capture. The recording is not transcribed;
    /// fixed placeholder text stands in, and the reply is spoken.
    pub async fn submit_voice(&self, recording: RecordingHandle) -> SubmitOutcome {
        debug!(
            "Submitting voice message ({:.1}s captured)",
            recording.duration.as_secs_f32()
        );
        self.round_trip(VOICE_MESSAGE_TEXT, Some(recording.path), true, false)
            .await
    }

    /// Empty the transcript unconditionally.
    pub fn clear(&self) {
        debug!("Clearing conversation");
        self.store.clear();
    }

    /// Replay a single transcript message through the synthesizer.
    pub async fn speak_message(&self, id: Uuid) -> Result<()> {
        let message = self
            .store
            .get(id)
            .ok_or_else(|| AuraError::Synthesis(format!("No such message: {id}")))?;

        if !self.synthesizer.is_supported() {
            warn!("Speech synthesis not supported on this platform");
            return Ok(());
        }

        self.store.set_emotion(AvatarEmotion::Speaking);
        let result = self.synthesizer.speak(&message.text, &self.voice).await;
        self.store.set_emotion(AvatarEmotion::Neutral);
        result
    }

    async fn round_trip(
        &self,
        text: &str,
        audio: Option<PathBuf>,
        speak: bool,
        streaming: bool,
    ) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::EmptyInput;
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Submit rejected: a round-trip is already in flight");
            return SubmitOutcome::Busy;
        }

        self.store.set_loading(true);
        self.store.set_emotion(AvatarEmotion::Thinking);

        let mut user_draft = MessageDraft::user(text);
        if let Some(path) = audio {
            user_draft = user_draft.with_audio(path);
        }
        self.store.append(user_draft);

        // Prompt built before the placeholder exists, so context mode never
        // sees the in-flight entry
        let prompt = if self.context_replies {
            format_context_prompt(&self.store.messages())
        } else {
            text.to_owned()
        };

        self.store.append(MessageDraft::typing_placeholder());

        let reply = if streaming {
            self.generate_streaming(&prompt).await
        } else {
            self.generator.generate(&prompt).await
        };

        let final_text = match reply {
            Ok(reply_text) => {
                self.store.replace_last_assistant_text(&reply_text);
                Some(reply_text)
            }
            Err(e) => {
                error!("Generation failed: {}", e);
                self.store.replace_last_assistant_text(FALLBACK_REPLY);
                None
            }
        };
        self.store.set_emotion(AvatarEmotion::Neutral);
        self.store.set_loading(false);

        if let Some(reply_text) = final_text {
            if speak && self.synthesizer.is_supported() {
                self.store.set_emotion(AvatarEmotion::Speaking);
                if let Err(e) = self.synthesizer.speak(&reply_text, &self.voice).await {
                    warn!("Speech synthesis failed: {}", e);
                }
                self.store.set_emotion(AvatarEmotion::Neutral);
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
        SubmitOutcome::Completed
    }

    async fn generate_streaming(&self, prompt: &str) -> Result<String> {
        let mut fragments = self.generator.generate_stream(prompt);
        let mut full = String::new();

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            full.push_str(&fragment);
            self.store.append_to_last_assistant(&fragment);
        }

        if full.is_empty() {
            return Err(AuraError::Generation("Stream produced no text".to_string()));
        }
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Sender;
    use crate::speech::VoiceDescriptor;
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct FixedGenerator {
        reply: String,
    }

    impl FixedGenerator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl ResponseGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.reply.clone())
        }

        fn generate_stream(&self, _prompt: &str) -> BoxStream<'static, Result<String>> {
            futures::stream::iter(vec![Ok(self.reply.clone())]).boxed()
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ResponseGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(AuraError::Generation("boom".to_string()))
        }

        fn generate_stream(&self, _prompt: &str) -> BoxStream<'static, Result<String>> {
            futures::stream::iter(vec![Err(AuraError::Generation("boom".to_string()))]).boxed()
        }
    }

    /// Records every prompt it receives.
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        reply: String,
    }

    impl RecordingGenerator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl ResponseGenerator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn generate_stream(&self, _prompt: &str) -> BoxStream<'static, Result<String>> {
            futures::stream::iter(vec![Ok(self.reply.clone())]).boxed()
        }
    }

    /// Asserts the mid-flight placeholder invariant from inside generate.
    struct InspectingGenerator {
        store: ConversationStore,
    }

    #[async_trait]
    impl ResponseGenerator for InspectingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            let snapshot = self.store.snapshot();
            let typing: Vec<_> = snapshot.messages.iter().filter(|m| m.is_typing).collect();
            assert_eq!(typing.len(), 1);
            assert!(snapshot.messages.last().unwrap().is_typing);
            assert!(snapshot.is_loading);
            assert_eq!(snapshot.emotion, AvatarEmotion::Thinking);
            Ok("done".to_string())
        }

        fn generate_stream(&self, _prompt: &str) -> BoxStream<'static, Result<String>> {
            futures::stream::iter(vec![Ok("done".to_string())]).boxed()
        }
    }

    /// Blocks inside generate until released.
    struct GatedGenerator {
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl ResponseGenerator for GatedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.gate.notified().await;
            Ok("late".to_string())
        }

        fn generate_stream(&self, _prompt: &str) -> BoxStream<'static, Result<String>> {
            futures::stream::iter(vec![Ok("late".to_string())]).boxed()
        }
    }

    struct CountingSynth {
        supported: bool,
        spoken: Mutex<Vec<String>>,
    }

    impl CountingSynth {
        fn new(supported: bool) -> Arc<Self> {
            Arc::new(Self {
                supported,
                spoken: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for CountingSynth {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn speak(&self, text: &str, _options: &VoiceOptions) -> Result<()> {
            self.spoken.lock().push(text.to_string());
            Ok(())
        }

        async fn stop(&self) {}

        fn list_voices(&self) -> Vec<VoiceDescriptor> {
            Vec::new()
        }
    }

    fn orchestrator_with(
        generator: Arc<dyn ResponseGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Orchestrator {
        Orchestrator::new(ConversationStore::new(), generator, synthesizer)
    }

    #[tokio::test]
    async fn test_submit_appends_user_and_assistant() {
        let orchestrator =
            orchestrator_with(FixedGenerator::new("Hi there!"), CountingSynth::new(true));

        let outcome = orchestrator.submit("Hello", false).await;
        assert_eq!(outcome, SubmitOutcome::Completed);

        let snapshot = orchestrator.store().snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[0].text, "Hello");
        assert!(snapshot.messages[0].is_user());
        assert_eq!(snapshot.messages[1].text, "Hi there!");
        assert_eq!(snapshot.messages[1].sender, Sender::Assistant);
        assert!(!snapshot.messages[1].is_typing);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.emotion, AvatarEmotion::Neutral);
    }

    #[tokio::test]
    async fn test_failure_substitutes_fallback() {
        let orchestrator =
            orchestrator_with(Arc::new(FailingGenerator), CountingSynth::new(true));

        let outcome = orchestrator.submit("Hello", false).await;
        assert_eq!(outcome, SubmitOutcome::Completed);

        let snapshot = orchestrator.store().snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[1].text, FALLBACK_REPLY);
        assert!(!snapshot.messages[1].is_typing);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.emotion, AvatarEmotion::Neutral);
    }

    #[tokio::test]
    async fn test_fallback_reply_is_not_spoken() {
        let synth = CountingSynth::new(true);
        let orchestrator = orchestrator_with(Arc::new(FailingGenerator), synth.clone());

        orchestrator.submit("Hello", true).await;
        assert!(synth.spoken.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_submit_is_noop() {
        let orchestrator =
            orchestrator_with(FixedGenerator::new("unused"), CountingSynth::new(true));

        let outcome = orchestrator.submit("   ", false).await;
        assert_eq!(outcome, SubmitOutcome::EmptyInput);
        assert!(orchestrator.store().is_empty());
        assert!(!orchestrator.store().is_loading());
    }

    #[tokio::test]
    async fn test_placeholder_is_tail_mid_flight() {
        let store = ConversationStore::new();
        let generator = Arc::new(InspectingGenerator {
            store: store.clone(),
        });
        let orchestrator = Orchestrator::new(store, generator, CountingSynth::new(false));

        orchestrator.submit("Hello", false).await;

        let messages = orchestrator.store().messages();
        assert!(messages.iter().all(|m| !m.is_typing));
    }

    #[tokio::test]
    async fn test_overlapping_submit_is_rejected() {
        let generator = Arc::new(GatedGenerator {
            gate: tokio::sync::Notify::new(),
        });
        let orchestrator = Arc::new(orchestrator_with(
            generator.clone(),
            CountingSynth::new(false),
        ));

        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.submit("first", false).await })
        };

        // Wait for the first round-trip to reach the generator
        while !orchestrator.is_busy() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let second = orchestrator.submit("second", false).await;
        assert_eq!(second, SubmitOutcome::Busy);

        generator.gate.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Completed);

        // Only the first round-trip touched the transcript
        assert_eq!(orchestrator.store().len(), 2);
    }

    #[tokio::test]
    async fn test_streaming_merges_fragments_in_order() {
        struct FragmentGenerator {
            store: ConversationStore,
        }

        #[async_trait]
        impl ResponseGenerator for FragmentGenerator {
            async fn generate(&self, _prompt: &str) -> Result<String> {
                unreachable!("streaming path only")
            }

            fn generate_stream(&self, _prompt: &str) -> BoxStream<'static, Result<String>> {
                let store = self.store.clone();
                Box::pin(async_stream::stream! {
                    yield Ok("Hi ".to_string());
                    // By the time the next fragment is polled for, the
                    // previous one has been merged into the placeholder.
                    let tail = store.messages().last().cloned().unwrap();
                    assert_eq!(tail.text, "Hi ");
                    assert!(tail.is_typing);
                    yield Ok("there!".to_string());
                })
            }
        }

        let store = ConversationStore::new();
        let generator = Arc::new(FragmentGenerator {
            store: store.clone(),
        });
        let orchestrator = Orchestrator::new(store, generator, CountingSynth::new(false));

        let outcome = orchestrator.submit_streaming("Hello", false).await;
        assert_eq!(outcome, SubmitOutcome::Completed);

        let messages = orchestrator.store().messages();
        assert_eq!(messages[1].text, "Hi there!");
        assert!(!messages[1].is_typing);
    }

    #[tokio::test]
    async fn test_streaming_failure_substitutes_fallback() {
        let orchestrator =
            orchestrator_with(Arc::new(FailingGenerator), CountingSynth::new(false));

        orchestrator.submit_streaming("Hello", false).await;

        let messages = orchestrator.store().messages();
        assert_eq!(messages[1].text, FALLBACK_REPLY);
        assert!(!messages[1].is_typing);
    }

    #[tokio::test]
    async fn test_voice_submit_uses_placeholder_text_and_speaks() {
        let synth = CountingSynth::new(true);
        let orchestrator = orchestrator_with(FixedGenerator::new("Nice to hear you"), synth.clone());

        let recording = RecordingHandle {
            path: std::env::temp_dir().join("aura-test-recording.wav"),
            duration: Duration::from_secs(2),
            sample_rate: 16000,
        };
        let outcome = orchestrator.submit_voice(recording).await;
        assert_eq!(outcome, SubmitOutcome::Completed);

        let messages = orchestrator.store().messages();
        assert_eq!(messages[0].text, VOICE_MESSAGE_TEXT);
        assert!(messages[0].audio.is_some());
        assert_eq!(*synth.spoken.lock(), vec!["Nice to hear you".to_string()]);
    }

    #[tokio::test]
    async fn test_unsupported_synthesizer_is_skipped() {
        let synth = CountingSynth::new(false);
        let orchestrator = orchestrator_with(FixedGenerator::new("Hi"), synth.clone());

        orchestrator.submit("Hello", true).await;
        assert!(synth.spoken.lock().is_empty());
        assert_eq!(orchestrator.store().emotion(), AvatarEmotion::Neutral);
    }

    #[tokio::test]
    async fn test_context_mode_sends_prior_turns() {
        let generator = RecordingGenerator::new("ok");
        let orchestrator = Orchestrator::new(
            ConversationStore::new(),
            generator.clone(),
            CountingSynth::new(false),
        )
        .with_context_replies(true);

        orchestrator.submit("first question", false).await;
        orchestrator.submit("second question", false).await;

        let prompts = generator.prompts.lock();
        assert_eq!(prompts[0], "user: first question");
        assert_eq!(
            prompts[1],
            "user: first question\nassistant: ok\nuser: second question"
        );
    }

    #[tokio::test]
    async fn test_base_mode_sends_raw_input() {
        let generator = RecordingGenerator::new("ok");
        let orchestrator = Orchestrator::new(
            ConversationStore::new(),
            generator.clone(),
            CountingSynth::new(false),
        );

        orchestrator.submit("  just this  ", false).await;
        assert_eq!(*generator.prompts.lock(), vec!["just this".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_empties_transcript() {
        let orchestrator = orchestrator_with(FixedGenerator::new("Hi"), CountingSynth::new(false));

        orchestrator.submit("one", false).await;
        orchestrator.submit("two", false).await;
        assert_eq!(orchestrator.store().len(), 4);

        orchestrator.clear();
        assert!(orchestrator.store().is_empty());
    }

    #[tokio::test]
    async fn test_growth_is_two_entries_per_submit() {
        let orchestrator =
            orchestrator_with(Arc::new(FailingGenerator), CountingSynth::new(false));

        for i in 0..3 {
            orchestrator.submit(&format!("message {i}"), false).await;
        }
        assert_eq!(orchestrator.store().len(), 6);
    }

    #[tokio::test]
    async fn test_speak_message_replays_text() {
        let synth = CountingSynth::new(true);
        let orchestrator = orchestrator_with(FixedGenerator::new("Hi"), synth.clone());

        orchestrator.submit("Hello", false).await;
        let id = orchestrator.store().messages()[1].id;

        orchestrator.speak_message(id).await.unwrap();
        assert_eq!(*synth.spoken.lock(), vec!["Hi".to_string()]);
        assert_eq!(orchestrator.store().emotion(), AvatarEmotion::Neutral);
    }
}
