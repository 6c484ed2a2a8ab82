//! Notification dispatch - scans certificates for upcoming/elapsed expiry,
//! queues notification rows and delivers due ones with retry/backoff.
//!
//! Notification rows double as the delivery queue; there is no separate
//! queue table.

use crate::application::retry::{DispatchRetry, RetryDecision};
use crate::application::status::StatusPolicy;
use crate::domain::{
    Certificate, Employee, Notification, NotificationKind, TrainingType,
};
use crate::error::Result;
use crate::port::{
    CertificateRepository, EmployeeRepository, IdProvider, MailMessage, MailSender,
    NotificationRepository, TimeProvider, TrainingTypeRepository,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Re-notify window: a warning for the same certificate is not repeated
/// within this many days
pub const RENOTIFY_DAYS: i64 = 7;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Counters from one dispatch pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub scanned: usize,
    pub warnings_created: usize,
    pub expired_marked: usize,
    pub expired_notices: usize,
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Scans certificates and drives the notification queue
pub struct NotificationDispatcher {
    certificate_repo: Arc<dyn CertificateRepository>,
    employee_repo: Arc<dyn EmployeeRepository>,
    training_type_repo: Arc<dyn TrainingTypeRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
    mail_sender: Arc<dyn MailSender>,
    retry_policy: DispatchRetry,
    status_policy: StatusPolicy,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    delivery_batch_size: i64,
}

impl NotificationDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        certificate_repo: Arc<dyn CertificateRepository>,
        employee_repo: Arc<dyn EmployeeRepository>,
        training_type_repo: Arc<dyn TrainingTypeRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        mail_sender: Arc<dyn MailSender>,
        retry_policy: DispatchRetry,
        status_policy: StatusPolicy,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        delivery_batch_size: i64,
    ) -> Self {
        Self {
            certificate_repo,
            employee_repo,
            training_type_repo,
            notification_repo,
            mail_sender,
            retry_policy,
            status_policy,
            id_provider,
            time_provider,
            delivery_batch_size,
        }
    }

    /// Full dispatch pass: scan for warnings, mark overdue, deliver due rows
    pub async fn run(&self) -> Result<DispatchStats> {
        let mut stats = self.scan_expiring().await?;
        let expired = self.monitor_expired().await?;
        stats.expired_marked = expired.expired_marked;
        stats.expired_notices = expired.expired_notices;

        let delivery = self.deliver_pending().await?;
        stats.delivered = delivery.delivered;
        stats.retried = delivery.retried;
        stats.failed = delivery.failed;

        info!(
            scanned = stats.scanned,
            warnings = stats.warnings_created,
            expired = stats.expired_marked,
            delivered = stats.delivered,
            retried = stats.retried,
            failed = stats.failed,
            "Dispatch pass completed"
        );
        Ok(stats)
    }

    /// Queue EXPIRY_WARNING notifications for certificates inside their
    /// warning window. Re-notification for the same certificate is
    /// suppressed for RENOTIFY_DAYS.
    pub async fn scan_expiring(&self) -> Result<DispatchStats> {
        let today = self.time_provider.today();
        let now = self.time_provider.now_millis();
        let types = self.training_types_by_id().await?;

        // Widest window across all types bounds the candidate query; the
        // per-type window filters below
        let max_window = types
            .values()
            .filter_map(|t| t.warning_window_days)
            .chain(std::iter::once(self.status_policy.warning_window_days()))
            .max()
            .unwrap_or(self.status_policy.warning_window_days());

        let candidates = self
            .certificate_repo
            .find_expiring_between(today, today + chrono::Duration::days(max_window))
            .await?;

        let mut stats = DispatchStats {
            scanned: candidates.len(),
            ..Default::default()
        };

        for mut certificate in candidates {
            let training_type = types.get(&certificate.training_type_id);
            let window = self.status_policy.window_for(training_type.map(|t| &**t));

            if self
                .status_policy
                .derive(certificate.expiry_date, today, window)
                != crate::domain::CertificateStatus::ExpiringSoon
            {
                continue;
            }

            // Keep the cached status column in step with the derivation
            if self
                .status_policy
                .refresh(&mut certificate, today, now, window)?
            {
                self.certificate_repo.update(&certificate).await?;
            }

            let since = now - RENOTIFY_DAYS * DAY_MS;
            if self
                .notification_repo
                .exists_recent(&certificate.id, NotificationKind::ExpiryWarning, since)
                .await?
            {
                debug!(certificate_id = %certificate.id, "Warning already sent recently");
                continue;
            }

            let Some(employee) = self.auditable_employee(&certificate.employee_id).await? else {
                continue;
            };

            let notification = self.build_notification(
                &employee,
                &certificate,
                training_type.map(|t| &**t),
                NotificationKind::ExpiryWarning,
                now,
            );
            self.notification_repo.insert(&notification).await?;
            stats.warnings_created += 1;
        }

        Ok(stats)
    }

    /// Mark overdue certificates EXPIRED and queue an EXPIRED notice once
    pub async fn monitor_expired(&self) -> Result<DispatchStats> {
        let today = self.time_provider.today();
        let now = self.time_provider.now_millis();
        let types = self.training_types_by_id().await?;

        let overdue = self.certificate_repo.find_overdue(today).await?;
        let mut stats = DispatchStats::default();

        for mut certificate in overdue {
            let training_type = types.get(&certificate.training_type_id);
            let window = self.status_policy.window_for(training_type.map(|t| &**t));

            if self
                .status_policy
                .refresh(&mut certificate, today, now, window)?
            {
                self.certificate_repo.update(&certificate).await?;
                stats.expired_marked += 1;
            }

            // One EXPIRED notice per certificate, ever
            if self
                .notification_repo
                .exists_recent(&certificate.id, NotificationKind::Expired, 0)
                .await?
            {
                continue;
            }

            let Some(employee) = self.auditable_employee(&certificate.employee_id).await? else {
                continue;
            };

            let notification = self.build_notification(
                &employee,
                &certificate,
                training_type.map(|t| &**t),
                NotificationKind::Expired,
                now,
            );
            self.notification_repo.insert(&notification).await?;
            stats.expired_notices += 1;
        }

        Ok(stats)
    }

    /// Deliver due PENDING notifications, applying the retry policy on
    /// failure
    pub async fn deliver_pending(&self) -> Result<DispatchStats> {
        let now = self.time_provider.now_millis();
        let due = self
            .notification_repo
            .find_due_pending(now, self.delivery_batch_size)
            .await?;

        let mut stats = DispatchStats::default();

        for mut notification in due {
            let Some(employee) = self.employee_repo.find_by_id(&notification.employee_id).await?
            else {
                notification.mark_failed("Employee no longer exists");
                self.notification_repo.update(&notification).await?;
                stats.failed += 1;
                continue;
            };

            let message = MailMessage {
                to: employee.email.clone(),
                subject: notification.subject.clone(),
                body: notification.body.clone(),
            };

            match self.mail_sender.send(&message).await {
                Ok(()) => {
                    notification.mark_sent(self.time_provider.now_millis());
                    self.notification_repo.update(&notification).await?;
                    stats.delivered += 1;
                }
                Err(err) => match self.retry_policy.should_retry(&notification) {
                    RetryDecision::Retry(delay_ms) => {
                        let next = self.retry_policy.next_attempt_at(delay_ms);
                        notification.record_failure(err.to_string(), next);
                        self.notification_repo.update(&notification).await?;
                        stats.retried += 1;
                    }
                    RetryDecision::Failed => {
                        notification.mark_failed(err.to_string());
                        self.notification_repo.update(&notification).await?;
                        warn!(
                            notification_id = %notification.id,
                            employee_id = %notification.employee_id,
                            "Notification delivery failed permanently"
                        );
                        self.raise_task_failure(&notification, now).await?;
                        stats.failed += 1;
                    }
                },
            }
        }

        Ok(stats)
    }

    /// Leave an admin trail when a delivery is abandoned. TASK_FAILURE
    /// rows never raise further failures, so this cannot loop.
    async fn raise_task_failure(&self, failed: &Notification, now: i64) -> Result<()> {
        if failed.kind == NotificationKind::TaskFailure {
            return Ok(());
        }
        let mut record = Notification::new(
            self.id_provider.generate_id(),
            now,
            failed.employee_id.clone(),
            NotificationKind::TaskFailure,
            format!("Delivery failed: {}", failed.subject),
            format!(
                "Notification {} ({}) could not be delivered after {} attempts. \
                 Last error: {}",
                failed.id,
                failed.kind,
                failed.attempts,
                failed.last_error.as_deref().unwrap_or("unknown"),
            ),
        );
        record.certificate_id = failed.certificate_id.clone();
        // Admin trail only; nothing is mailed for it
        record.mark_failed("not deliverable, audit record");
        self.notification_repo.insert(&record).await?;
        Ok(())
    }

    async fn training_types_by_id(&self) -> Result<HashMap<String, Arc<TrainingType>>> {
        Ok(self
            .training_type_repo
            .list()
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), Arc::new(t)))
            .collect())
    }

    /// Employees who left no longer receive notifications
    async fn auditable_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        Ok(self
            .employee_repo
            .find_by_id(&employee_id.to_string())
            .await?
            .filter(|e| e.is_auditable()))
    }

    fn build_notification(
        &self,
        employee: &Employee,
        certificate: &Certificate,
        training_type: Option<&TrainingType>,
        kind: NotificationKind,
        now: i64,
    ) -> Notification {
        let type_name = training_type
            .map(|t| t.name.as_str())
            .unwrap_or("a certification");

        let (subject, body) = match kind {
            NotificationKind::ExpiryWarning => (
                format!("{} expires soon", type_name),
                format!(
                    "Hello {},\n\nYour {} certificate (verification code {}) expires on {}. \
                     Please arrange renewal before that date.",
                    employee.full_name,
                    type_name,
                    certificate.verification_code.as_str(),
                    certificate
                        .expiry_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                ),
            ),
            NotificationKind::Expired => (
                format!("{} has expired", type_name),
                format!(
                    "Hello {},\n\nYour {} certificate (verification code {}) expired on {}. \
                     You are no longer compliant for this training type.",
                    employee.full_name,
                    type_name,
                    certificate.verification_code.as_str(),
                    certificate
                        .expiry_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                ),
            ),
            other => (
                format!("{}", other),
                format!("Hello {},\n\nPlease contact HR.", employee.full_name),
            ),
        };

        let mut notification = Notification::new(
            self.id_provider.generate_id(),
            now,
            employee.id.clone(),
            kind,
            subject,
            body,
        );
        notification.certificate_id = Some(certificate.id.clone());
        notification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CertificateStatus, ComplianceStatus, DispatchState, EmployeeId, EmploymentStatus,
        TrainingTypeId,
    };
    use crate::port::id_provider::mocks::MockIdProvider;
    use crate::port::mail_sender::mocks::{MockBehavior, MockMailSender};
    use crate::port::time_provider::mocks::MockTimeProvider;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Default)]
    struct InMemoryCerts {
        certs: Mutex<Vec<Certificate>>,
    }

    #[async_trait]
    impl CertificateRepository for InMemoryCerts {
        async fn insert(&self, certificate: &Certificate) -> Result<()> {
            self.certs.lock().unwrap().push(certificate.clone());
            Ok(())
        }
        async fn update(&self, certificate: &Certificate) -> Result<()> {
            let mut certs = self.certs.lock().unwrap();
            if let Some(c) = certs.iter_mut().find(|c| c.id == certificate.id) {
                *c = certificate.clone();
            }
            Ok(())
        }
        async fn find_by_id(&self, id: &String) -> Result<Option<Certificate>> {
            Ok(self.certs.lock().unwrap().iter().find(|c| &c.id == id).cloned())
        }
        async fn find_current_for(&self, employee_id: &String) -> Result<Vec<Certificate>> {
            Ok(self
                .certs
                .lock()
                .unwrap()
                .iter()
                .filter(|c| &c.employee_id == employee_id && !c.status.is_terminal())
                .cloned()
                .collect())
        }
        async fn find_expiring_between(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<Certificate>> {
            Ok(self
                .certs
                .lock()
                .unwrap()
                .iter()
                .filter(|c| {
                    !c.status.is_terminal()
                        && c.expiry_date.map(|e| e >= from && e <= to).unwrap_or(false)
                })
                .cloned()
                .collect())
        }
        async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Certificate>> {
            Ok(self
                .certs
                .lock()
                .unwrap()
                .iter()
                .filter(|c| {
                    !c.status.is_terminal()
                        && c.expiry_date.map(|e| e < today).unwrap_or(false)
                })
                .cloned()
                .collect())
        }
        async fn find_non_terminal(&self) -> Result<Vec<Certificate>> {
            Ok(self
                .certs
                .lock()
                .unwrap()
                .iter()
                .filter(|c| !c.status.is_terminal())
                .cloned()
                .collect())
        }
        async fn update_status(
            &self,
            id: &String,
            status: CertificateStatus,
            now_millis: i64,
        ) -> Result<()> {
            let mut certs = self.certs.lock().unwrap();
            if let Some(c) = certs.iter_mut().find(|c| &c.id == id) {
                c.status = status;
                c.status_updated_at = Some(now_millis);
            }
            Ok(())
        }
        async fn count_by_status(&self, status: CertificateStatus) -> Result<i64> {
            Ok(self
                .certs
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.status == status)
                .count() as i64)
        }
        async fn list_all(&self) -> Result<Vec<Certificate>> {
            Ok(self.certs.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct InMemoryEmployees {
        employees: Mutex<Vec<Employee>>,
    }

    #[async_trait]
    impl EmployeeRepository for InMemoryEmployees {
        async fn insert(&self, employee: &Employee) -> Result<()> {
            self.employees.lock().unwrap().push(employee.clone());
            Ok(())
        }
        async fn update(&self, employee: &Employee) -> Result<()> {
            let mut list = self.employees.lock().unwrap();
            if let Some(e) = list.iter_mut().find(|e| e.id == employee.id) {
                *e = employee.clone();
            }
            Ok(())
        }
        async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>> {
            Ok(self.employees.lock().unwrap().iter().find(|e| &e.id == id).cloned())
        }
        async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
            Ok(self
                .employees
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.email == email)
                .cloned())
        }
        async fn list(&self, _status: Option<EmploymentStatus>) -> Result<Vec<Employee>> {
            Ok(self.employees.lock().unwrap().clone())
        }
        async fn update_compliance(
            &self,
            _id: &EmployeeId,
            _status: ComplianceStatus,
            _now_millis: i64,
        ) -> Result<()> {
            Ok(())
        }
        async fn touch_container_checked(&self, _id: &EmployeeId, _now_millis: i64) -> Result<()> {
            Ok(())
        }
        async fn count_by_status(&self, _status: EmploymentStatus) -> Result<i64> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct InMemoryTypes {
        types: Mutex<Vec<TrainingType>>,
    }

    #[async_trait]
    impl TrainingTypeRepository for InMemoryTypes {
        async fn insert(&self, training_type: &TrainingType) -> Result<()> {
            self.types.lock().unwrap().push(training_type.clone());
            Ok(())
        }
        async fn find_by_id(&self, id: &TrainingTypeId) -> Result<Option<TrainingType>> {
            Ok(self.types.lock().unwrap().iter().find(|t| &t.id == id).cloned())
        }
        async fn find_by_code(&self, code: &str) -> Result<Option<TrainingType>> {
            Ok(self.types.lock().unwrap().iter().find(|t| t.code == code).cloned())
        }
        async fn list(&self) -> Result<Vec<TrainingType>> {
            Ok(self.types.lock().unwrap().clone())
        }
        async fn list_mandatory(&self) -> Result<Vec<TrainingType>> {
            Ok(self
                .types
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.mandatory)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct InMemoryNotifications {
        rows: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationRepository for InMemoryNotifications {
        async fn insert(&self, notification: &Notification) -> Result<()> {
            self.rows.lock().unwrap().push(notification.clone());
            Ok(())
        }
        async fn update(&self, notification: &Notification) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(n) = rows.iter_mut().find(|n| n.id == notification.id) {
                *n = notification.clone();
            }
            Ok(())
        }
        async fn find_by_id(&self, id: &String) -> Result<Option<Notification>> {
            Ok(self.rows.lock().unwrap().iter().find(|n| &n.id == id).cloned())
        }
        async fn find_due_pending(&self, now_millis: i64, limit: i64) -> Result<Vec<Notification>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|n| {
                    n.state == DispatchState::Pending
                        && n.next_attempt_at.map(|t| t <= now_millis).unwrap_or(true)
                })
                .take(limit as usize)
                .cloned()
                .collect())
        }
        async fn exists_recent(
            &self,
            certificate_id: &str,
            kind: NotificationKind,
            since_millis: i64,
        ) -> Result<bool> {
            Ok(self.rows.lock().unwrap().iter().any(|n| {
                n.certificate_id.as_deref() == Some(certificate_id)
                    && n.kind == kind
                    && n.created_at >= since_millis
            }))
        }
        async fn count_by_state(&self, state: DispatchState) -> Result<i64> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.state == state)
                .count() as i64)
        }
        async fn list_recent(&self, limit: i64) -> Result<Vec<Notification>> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by_key(|n| std::cmp::Reverse(n.created_at));
            rows.truncate(limit as usize);
            Ok(rows)
        }
    }

    struct Fixture {
        certs: Arc<InMemoryCerts>,
        employees: Arc<InMemoryEmployees>,
        types: Arc<InMemoryTypes>,
        notifications: Arc<InMemoryNotifications>,
        mailer: Arc<MockMailSender>,
        time: Arc<MockTimeProvider>,
    }

    impl Fixture {
        fn new(behavior: MockBehavior) -> Self {
            Self {
                certs: Arc::new(InMemoryCerts::default()),
                employees: Arc::new(InMemoryEmployees::default()),
                types: Arc::new(InMemoryTypes::default()),
                notifications: Arc::new(InMemoryNotifications::default()),
                mailer: Arc::new(MockMailSender::new(behavior)),
                time: Arc::new(MockTimeProvider::at_date(date(2025, 6, 1))),
            }
        }

        fn dispatcher(&self) -> NotificationDispatcher {
            NotificationDispatcher::new(
                self.certs.clone(),
                self.employees.clone(),
                self.types.clone(),
                self.notifications.clone(),
                self.mailer.clone(),
                DispatchRetry::new(self.time.clone(), 60_000),
                StatusPolicy::new(30),
                Arc::new(MockIdProvider::new("n")),
                self.time.clone(),
                100,
            )
        }
    }

    async fn seed_expiring(fx: &Fixture) -> (Employee, Certificate) {
        let tt = TrainingType::new_test("FIRST-AID", true);
        fx.types.insert(&tt).await.unwrap();

        let employee = Employee::new_test("Test Person");
        fx.employees.insert(&employee).await.unwrap();

        let cert = Certificate::new_test(
            employee.id.clone(),
            tt.id.clone(),
            1,
            date(2024, 6, 20),
            Some(date(2025, 6, 20)), // 19 days out
        );
        fx.certs.insert(&cert).await.unwrap();
        (employee, cert)
    }

    #[tokio::test]
    async fn test_scan_creates_warning_once() {
        let fx = Fixture::new(MockBehavior::Success);
        seed_expiring(&fx).await;

        let dispatcher = fx.dispatcher();
        let first = dispatcher.scan_expiring().await.unwrap();
        assert_eq!(first.warnings_created, 1);

        // Second pass within the renotify window creates nothing
        let second = dispatcher.scan_expiring().await.unwrap();
        assert_eq!(second.warnings_created, 0);
    }

    #[tokio::test]
    async fn test_scan_renotifies_after_window() {
        let fx = Fixture::new(MockBehavior::Success);
        seed_expiring(&fx).await;

        let dispatcher = fx.dispatcher();
        dispatcher.scan_expiring().await.unwrap();

        fx.time.advance_millis((RENOTIFY_DAYS + 1) * DAY_MS);
        let again = dispatcher.scan_expiring().await.unwrap();
        assert_eq!(again.warnings_created, 1);
    }

    #[tokio::test]
    async fn test_scan_skips_terminated_employees() {
        let fx = Fixture::new(MockBehavior::Success);
        let (mut employee, _) = seed_expiring(&fx).await;
        employee.status = EmploymentStatus::Terminated;
        fx.employees.update(&employee).await.unwrap();

        let stats = fx.dispatcher().scan_expiring().await.unwrap();
        assert_eq!(stats.warnings_created, 0);
    }

    #[tokio::test]
    async fn test_scan_refreshes_cached_status() {
        let fx = Fixture::new(MockBehavior::Success);
        let (_, cert) = seed_expiring(&fx).await;
        assert_eq!(cert.status, CertificateStatus::Active);

        fx.dispatcher().scan_expiring().await.unwrap();

        let stored = fx.certs.find_by_id(&cert.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CertificateStatus::ExpiringSoon);
    }

    #[tokio::test]
    async fn test_monitor_marks_expired_and_notifies_once() {
        let fx = Fixture::new(MockBehavior::Success);
        let tt = TrainingType::new_test("WHMIS", true);
        fx.types.insert(&tt).await.unwrap();

        let employee = Employee::new_test("Late Person");
        fx.employees.insert(&employee).await.unwrap();

        let cert = Certificate::new_test(
            employee.id.clone(),
            tt.id.clone(),
            1,
            date(2024, 1, 1),
            Some(date(2025, 1, 1)),
        );
        fx.certs.insert(&cert).await.unwrap();

        let dispatcher = fx.dispatcher();
        let first = dispatcher.monitor_expired().await.unwrap();
        assert_eq!(first.expired_marked, 1);
        assert_eq!(first.expired_notices, 1);

        let stored = fx.certs.find_by_id(&cert.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CertificateStatus::Expired);

        let second = dispatcher.monitor_expired().await.unwrap();
        assert_eq!(second.expired_marked, 0);
        assert_eq!(second.expired_notices, 0);
    }

    #[tokio::test]
    async fn test_deliver_marks_sent() {
        let fx = Fixture::new(MockBehavior::Success);
        seed_expiring(&fx).await;

        let dispatcher = fx.dispatcher();
        dispatcher.scan_expiring().await.unwrap();
        let stats = dispatcher.deliver_pending().await.unwrap();

        assert_eq!(stats.delivered, 1);
        assert_eq!(fx.mailer.sent_messages().len(), 1);
        assert_eq!(
            fx.notifications.count_by_state(DispatchState::Sent).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_deliver_schedules_retry_with_backoff() {
        let fx = Fixture::new(MockBehavior::FailFirst(1));
        seed_expiring(&fx).await;

        let dispatcher = fx.dispatcher();
        dispatcher.scan_expiring().await.unwrap();

        let stats = dispatcher.deliver_pending().await.unwrap();
        assert_eq!(stats.retried, 1);

        // Not due yet, nothing delivered
        let immediate = dispatcher.deliver_pending().await.unwrap();
        assert_eq!(immediate.delivered, 0);

        // Past the backoff the retry succeeds
        fx.time.advance_millis(2 * 60_000);
        let later = dispatcher.deliver_pending().await.unwrap();
        assert_eq!(later.delivered, 1);
    }

    #[tokio::test]
    async fn test_deliver_fails_permanently_after_max_attempts() {
        let fx = Fixture::new(MockBehavior::Fail("smtp unavailable".to_string()));
        seed_expiring(&fx).await;

        let dispatcher = fx.dispatcher();
        dispatcher.scan_expiring().await.unwrap();

        for _ in 0..5 {
            dispatcher.deliver_pending().await.unwrap();
            fx.time.advance_millis(10 * 60_000);
        }

        assert_eq!(
            fx.notifications.count_by_state(DispatchState::Pending).await.unwrap(),
            0
        );

        // The abandoned warning plus its TASK_FAILURE audit record
        let rows = fx.notifications.list_recent(10).await.unwrap();
        assert!(rows
            .iter()
            .any(|n| n.kind == NotificationKind::ExpiryWarning
                && n.state == DispatchState::Failed));
        assert!(rows.iter().any(|n| n.kind == NotificationKind::TaskFailure));
    }
}
