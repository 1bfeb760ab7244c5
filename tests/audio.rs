mod common;

use chrono::Duration;
use common::{FakeTts, ManualClock};
use std::sync::Arc;
use voxmail::audio::{
    AudioDeliveryManager, FallbackReason, MAX_SPEECH_CHARS, ProviderQuota, QuotaStatus, QuotaView,
    SpeechOutcome, SystemClock, TRUNCATION_MARKER, TtsProvider,
};

fn manager(tts: &Arc<FakeTts>, clock: &Arc<ManualClock>) -> AudioDeliveryManager {
    let provider: Arc<dyn TtsProvider> = tts.clone();
    AudioDeliveryManager::new(Some(provider), clock.clone())
}

fn fallback_reason(outcome: &SpeechOutcome) -> Option<FallbackReason> {
    match outcome {
        SpeechOutcome::LocalSynthesis { reason, .. } => Some(*reason),
        SpeechOutcome::Audio { .. } => None,
    }
}

#[tokio::test]
async fn unconfigured_manager_always_falls_back() {
    let audio = AudioDeliveryManager::new(None, Arc::new(SystemClock));
    assert!(!audio.is_configured());

    let outcome = audio.speak("Hello there", None).await;
    assert_eq!(
        outcome,
        SpeechOutcome::LocalSynthesis {
            text: "Hello there".into(),
            reason: FallbackReason::NotConfigured,
        }
    );
    assert_eq!(
        audio.check_quota_status().await,
        QuotaView::Unavailable { status: QuotaStatus::Unavailable }
    );
}

#[tokio::test]
async fn successful_synthesis_returns_audio() {
    let tts = Arc::new(FakeTts::with_remaining(10_000));
    let audio = manager(&tts, &Arc::new(ManualClock::new()));

    match audio.speak("Good morning", None).await {
        SpeechOutcome::Audio { bytes, content_type } => {
            assert_eq!(&bytes[..], b"ID3fake-mp3");
            assert_eq!(content_type, "audio/mpeg");
        }
        other => panic!("expected audio, got {other:?}"),
    }
    assert_eq!(tts.synth_calls(), 1);
    assert_eq!(tts.last_text().as_deref(), Some("Good morning"));
}

#[tokio::test]
async fn insufficient_quota_never_calls_the_provider() {
    // "hello world" needs 13 characters with the margin.
    let tts = Arc::new(FakeTts::with_remaining(12));
    let audio = manager(&tts, &Arc::new(ManualClock::new()));

    let outcome = audio.speak("hello world", None).await;
    assert_eq!(fallback_reason(&outcome), Some(FallbackReason::QuotaExceeded));
    assert_eq!(tts.synth_calls(), 0);

    let tts = Arc::new(FakeTts::with_remaining(13));
    let audio = manager(&tts, &Arc::new(ManualClock::new()));
    assert!(matches!(audio.speak("hello world", None).await, SpeechOutcome::Audio { .. }));
}

#[tokio::test]
async fn quota_check_failure_falls_back_without_synthesis() {
    let tts = Arc::new(FakeTts::new(None, false));
    let audio = manager(&tts, &Arc::new(ManualClock::new()));

    let outcome = audio.speak("hello", None).await;
    assert_eq!(fallback_reason(&outcome), Some(FallbackReason::QuotaUnknown));
    assert_eq!(tts.synth_calls(), 0);
    assert_eq!(
        audio.check_quota_status().await,
        QuotaView::Unavailable { status: QuotaStatus::Unavailable }
    );
}

#[tokio::test]
async fn provider_failure_falls_back_with_the_same_text() {
    let tts = Arc::new(FakeTts::new(Some(ProviderQuota { used: 0, limit: 10_000 }), true));
    let audio = manager(&tts, &Arc::new(ManualClock::new()));

    let outcome = audio.speak("You have two unread emails.", None).await;
    assert_eq!(
        outcome,
        SpeechOutcome::LocalSynthesis {
            text: "You have two unread emails.".into(),
            reason: FallbackReason::ProviderFailed,
        }
    );
    assert_eq!(tts.synth_calls(), 1);
}

#[tokio::test]
async fn quota_is_cached_until_the_ttl_expires() {
    let tts = Arc::new(FakeTts::with_remaining(10_000));
    let clock = Arc::new(ManualClock::new());
    let audio = manager(&tts, &clock);

    audio.speak("one", None).await;
    clock.advance(Duration::minutes(4));
    audio.speak("two", None).await;
    audio.check_quota_status().await;
    assert_eq!(tts.quota_calls(), 1);

    clock.advance(Duration::minutes(2));
    audio.speak("three", None).await;
    assert_eq!(tts.quota_calls(), 2);
    assert_eq!(tts.synth_calls(), 3);
}

#[tokio::test]
async fn successful_synthesis_debits_the_cached_quota() {
    let tts = Arc::new(FakeTts::with_remaining(30));
    let audio = manager(&tts, &Arc::new(ManualClock::new()));
    let text = "twenty characters!!!";

    assert!(matches!(audio.speak(text, None).await, SpeechOutcome::Audio { .. }));
    let outcome = audio.speak(text, None).await;
    assert_eq!(fallback_reason(&outcome), Some(FallbackReason::QuotaExceeded));
    assert_eq!(tts.quota_calls(), 1);
    assert_eq!(tts.synth_calls(), 1);

    let QuotaView::Known(report) = audio.check_quota_status().await else {
        panic!("quota should be known");
    };
    assert_eq!(report.quota.characters_remaining, 10);
    assert_eq!(report.status, QuotaStatus::Low);
}

#[tokio::test]
async fn long_text_is_truncated_before_synthesis() {
    let tts = Arc::new(FakeTts::with_remaining(50_000));
    let audio = manager(&tts, &Arc::new(ManualClock::new()));

    audio.speak(&"a".repeat(12_000), None).await;
    let sent = tts.last_text().expect("provider called");
    assert!(sent.ends_with(TRUNCATION_MARKER));
    assert_eq!(sent.chars().count(), MAX_SPEECH_CHARS + TRUNCATION_MARKER.chars().count());
}

#[tokio::test]
async fn quota_report_serializes_for_display() {
    let tts = Arc::new(FakeTts::new(Some(ProviderQuota { used: 99_500, limit: 100_000 }), false));
    let audio = manager(&tts, &Arc::new(ManualClock::new()));

    let view = audio.check_quota_status().await;
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["charactersUsed"], 99_500);
    assert_eq!(json["charactersLimit"], 100_000);
    assert_eq!(json["charactersRemaining"], 500);
    assert_eq!(json["percentageUsed"], 99.5);
    assert_eq!(json["status"], "low");
    assert!(json.get("lastChecked").is_some());
}
