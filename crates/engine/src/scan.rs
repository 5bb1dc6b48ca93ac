use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::watch;

use caixa_client::{ApiError, ReceiptScanner};
use caixa_core::EntryDraft;
use caixa_imaging::{is_image_like, resize_to_payload, ImagingError};

/// Longest side, in pixels, of the payload sent to the recognizer.
pub const RECEIPT_MAX_DIMENSION: u32 = 1600;

/// Hard cap on the encoded payload; bounds the request size without a
/// server round-trip.
pub const MAX_PAYLOAD_CHARS: usize = 9_500_000;

/// Fixed recognition-language hint sent with every scan.
pub const RECOGNITION_LANGUAGE: &str = "por";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Validating,
    Resizing,
    Uploading,
    Success,
    Failed,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("o arquivo selecionado não é uma imagem")]
    InvalidFile,
    #[error("já existe uma digitalização em andamento")]
    Busy,
    #[error("a imagem codificada tem {chars} caracteres, acima do limite de {MAX_PAYLOAD_CHARS}")]
    PayloadTooLarge { chars: usize },
    #[error("a imagem redimensionada não produziu um payload válido")]
    MalformedPayload,
    #[error(transparent)]
    Image(#[from] ImagingError),
    #[error("sessão expirada")]
    Unauthorized,
    #[error("{0}")]
    Service(String),
}

/// A photo handed to the workflow, as it came from the picker or camera.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// What a successful digitization produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The draft with recognized fields folded in; user edits survive.
    pub draft: EntryDraft,
    /// When present, the caller should retarget the active day filter so the
    /// entry is visible once saved.
    pub entry_date: Option<NaiveDate>,
    /// Advisory only; never blocks submission.
    pub confidence_pct: u8,
}

/// Orchestrates: validate → resize → upload → merge.
///
/// The phase machine runs `Idle → Validating → Resizing → Uploading →
/// {Success, Failed} → Idle`; it always returns to `Idle` so a new photo can
/// be submitted, and at most one digitization is in flight at a time.
pub struct ReceiptWorkflow {
    scanner: Arc<dyn ReceiptScanner>,
    phase_tx: watch::Sender<ScanPhase>,
    busy: AtomicBool,
}

impl ReceiptWorkflow {
    pub fn new(scanner: Arc<dyn ReceiptScanner>) -> Self {
        let (phase_tx, _) = watch::channel(ScanPhase::Idle);
        ReceiptWorkflow { scanner, phase_tx, busy: AtomicBool::new(false) }
    }

    /// Observe phase transitions, e.g. to disable the trigger control while
    /// a scan is running.
    pub fn phases(&self) -> watch::Receiver<ScanPhase> {
        self.phase_tx.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Runs one digitization against the current draft.
    ///
    /// Any step failure surfaces as a [`ScanError`] and the machine returns
    /// to `Idle` either way. A 401 during upload is a session failure, not a
    /// digitization failure: the client has already cleared the session
    /// store when [`ScanError::Unauthorized`] is returned.
    pub async fn digitize(
        &self,
        request: ScanRequest,
        draft: EntryDraft,
    ) -> Result<ScanOutcome, ScanError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(ScanError::Busy);
        }

        let result = self.run(request, draft).await;
        match &result {
            Ok(outcome) => {
                tracing::info!(confidence_pct = outcome.confidence_pct, "receipt digitized");
                self.phase_tx.send_replace(ScanPhase::Success);
            }
            Err(e) => {
                tracing::warn!("receipt digitization failed: {e}");
                self.phase_tx.send_replace(ScanPhase::Failed);
            }
        }
        self.phase_tx.send_replace(ScanPhase::Idle);
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    async fn run(
        &self,
        request: ScanRequest,
        draft: EntryDraft,
    ) -> Result<ScanOutcome, ScanError> {
        self.phase_tx.send_replace(ScanPhase::Validating);
        if !is_image_like(&request.file_name, request.content_type.as_deref()) {
            return Err(ScanError::InvalidFile);
        }

        self.phase_tx.send_replace(ScanPhase::Resizing);
        let payload = resize_to_payload(&request.bytes, RECEIPT_MAX_DIMENSION)?;
        check_payload(&payload)?;

        self.phase_tx.send_replace(ScanPhase::Uploading);
        let result = match self.scanner.scan_receipt(&payload, RECOGNITION_LANGUAGE).await {
            Ok(result) => result,
            Err(ApiError::Unauthorized) => return Err(ScanError::Unauthorized),
            Err(e) => return Err(ScanError::Service(e.to_string())),
        };

        Ok(ScanOutcome {
            entry_date: result.entry_date,
            confidence_pct: result.confidence_pct(),
            draft: draft.merge(&result),
        })
    }
}

/// Pre-upload payload checks: the encoded-image prefix and the size cap.
pub fn check_payload(payload: &str) -> Result<(), ScanError> {
    if !payload.starts_with("data:image/") {
        return Err(ScanError::MalformedPayload);
    }
    let chars = payload.chars().count();
    if chars > MAX_PAYLOAD_CHARS {
        return Err(ScanError::PayloadTooLarge { chars });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caixa_core::{EntryType, Money, RecognitionResult};
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use std::io::Cursor;
    use std::str::FromStr;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn tiny_png() -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(8, 8, |_, _| Luma([180u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn photo(bytes: Vec<u8>) -> ScanRequest {
        ScanRequest {
            file_name: "recibo.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes,
        }
    }

    #[derive(Default)]
    struct MockScanner {
        result: Mutex<Option<Result<RecognitionResult, ApiError>>>,
        calls: AtomicUsize,
    }

    impl MockScanner {
        fn returning(result: RecognitionResult) -> Arc<Self> {
            Arc::new(MockScanner {
                result: Mutex::new(Some(Ok(result))),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(err: ApiError) -> Arc<Self> {
            Arc::new(MockScanner {
                result: Mutex::new(Some(Err(err))),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReceiptScanner for MockScanner {
        async fn scan_receipt(
            &self,
            base64_image: &str,
            language: &str,
        ) -> Result<RecognitionResult, ApiError> {
            assert!(base64_image.starts_with("data:image/"));
            assert_eq!(language, RECOGNITION_LANGUAGE);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(RecognitionResult::default()))
        }
    }

    #[tokio::test]
    async fn digitize_merges_result_without_destroying_user_edits() {
        let scanner = MockScanner::returning(RecognitionResult {
            amount: Some(Money::from_str("120.5").unwrap()),
            entry_date: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            confidence: 0.73,
            ..RecognitionResult::default()
        });
        let workflow = ReceiptWorkflow::new(scanner.clone());

        let draft = EntryDraft {
            entry_type: EntryType::Out,
            description: "almoço".to_string(),
            ..EntryDraft::default()
        };
        let outcome = workflow.digitize(photo(tiny_png()), draft).await.unwrap();

        assert_eq!(outcome.draft.description, "almoço");
        assert_eq!(outcome.draft.amount.to_cents(), 12050);
        assert_eq!(outcome.confidence_pct, 73);
        assert_eq!(outcome.entry_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(scanner.calls(), 1);
        assert!(!workflow.is_busy());
        assert_eq!(*workflow.phases().borrow(), ScanPhase::Idle);
    }

    #[tokio::test]
    async fn non_image_file_is_rejected_before_any_upload() {
        let scanner = MockScanner::returning(RecognitionResult::default());
        let workflow = ReceiptWorkflow::new(scanner.clone());

        let request = ScanRequest {
            file_name: "nota.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: vec![1, 2, 3],
        };
        let err = workflow.digitize(request, EntryDraft::default()).await.unwrap_err();

        assert!(matches!(err, ScanError::InvalidFile));
        assert_eq!(scanner.calls(), 0);
        assert_eq!(*workflow.phases().borrow(), ScanPhase::Idle);
    }

    #[tokio::test]
    async fn corrupt_image_fails_in_resize_and_machine_returns_to_idle() {
        let scanner = MockScanner::returning(RecognitionResult::default());
        let workflow = ReceiptWorkflow::new(scanner.clone());

        let err = workflow
            .digitize(photo(b"not really a png".to_vec()), EntryDraft::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::Image(ImagingError::Decode(_))));
        assert_eq!(scanner.calls(), 0);
        assert!(!workflow.is_busy());
    }

    #[tokio::test]
    async fn unauthorized_upload_is_a_session_failure() {
        let scanner = MockScanner::failing(ApiError::Unauthorized);
        let workflow = ReceiptWorkflow::new(scanner);

        let err = workflow
            .digitize(photo(tiny_png()), EntryDraft::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::Unauthorized));
    }

    #[tokio::test]
    async fn service_failure_carries_the_service_message() {
        let scanner = MockScanner::failing(ApiError::Service {
            status: 422,
            message: "imagem ilegível, tente novamente".to_string(),
        });
        let workflow = ReceiptWorkflow::new(scanner);

        let err = workflow
            .digitize(photo(tiny_png()), EntryDraft::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "imagem ilegível, tente novamente");
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = format!("data:image/jpeg;base64,{}", "A".repeat(9_600_000));
        let err = check_payload(&payload).unwrap_err();
        assert!(matches!(err, ScanError::PayloadTooLarge { chars } if chars > MAX_PAYLOAD_CHARS));
    }

    #[test]
    fn payload_without_image_prefix_is_rejected() {
        assert!(matches!(check_payload("data:text/plain;base64,AAAA"), Err(ScanError::MalformedPayload)));
        assert!(check_payload("data:image/jpeg;base64,AAAA").is_ok());
    }
}
