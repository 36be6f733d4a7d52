//! Kiểu dữ liệu lõi cho phân loại lượt khám và thống kê theo tháng.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Cấu hình bộ phân loại: từ khóa khoa/phòng và các ngưỡng.
///
/// Mọi từ khóa được so sánh sau khi chuẩn hóa (gộp khoảng trắng, chữ thường)
/// nên không phân biệt hoa thường. Trường thiếu khi đọc JSON lấy giá trị mặc định.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierConfig {
    /// Khoa khám sức khỏe/tiêm chủng: luôn tính là khám mới thuần.
    pub preventive_care_keywords: Vec<String>,
    /// Dấu hiệu khám từ xa.
    pub telemedicine_keywords: Vec<String>,
    /// Dấu hiệu tự chi trả.
    pub self_pay_keywords: Vec<String>,
    /// Mã chương trình thuốc (AGA, ED...), so khớp theo nguyên từ.
    pub drug_program_markers: Vec<String>,
    /// Dấu hiệu bệnh nhân nước ngoài.
    pub foreign_patient_keywords: Vec<String>,
    /// Khoa nội soi dùng cho chỉ số `endoscopy_count`.
    pub endoscopy_keywords: Vec<String>,
    /// Cửa sổ số bệnh nhân so với số lớn nhất của tháng trước.
    pub number_window: i64,
    /// Tuổi hợp lệ phải nhỏ hơn giá trị này.
    pub max_valid_age: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            preventive_care_keywords: keywords(&[
                "health checkup",
                "executive physical",
                "vaccination",
            ]),
            telemedicine_keywords: keywords(&["telemedicine", "online consultation"]),
            self_pay_keywords: keywords(&["self-pay", "private"]),
            drug_program_markers: keywords(&["aga", "ed"]),
            foreign_patient_keywords: keywords(&["foreign", "overseas", "inbound"]),
            endoscopy_keywords: keywords(&["endoscopy", "gastroscopy", "colonoscopy"]),
            number_window: 200,
            max_valid_age: 120,
        }
    }
}

fn keywords(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Nhãn khám lần đầu/tái khám do hệ thống nguồn cung cấp (không đáng tin cậy).
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VisitType {
    FirstVisit,
    FollowUp,
    #[default]
    Unknown,
}

impl VisitType {
    /// Đọc nhãn tự do; giá trị không nhận ra trả về `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "first-visit" | "first_visit" | "first" | "new" => VisitType::FirstVisit,
            "follow-up" | "follow_up" | "followup" | "revisit" | "return" => VisitType::FollowUp,
            _ => VisitType::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for VisitType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(VisitType::parse).unwrap_or_default())
    }
}

/// Một lượt khám đầu vào (bất biến).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub date_iso: String,
    /// "YYYY-MM"; để trống thì suy ra từ `date_iso`.
    #[serde(default)]
    pub month_key: String,
    #[serde(default)]
    pub visit_type: VisitType,
    pub patient_number: Option<i64>,
    pub birth_date_iso: Option<String>,
    pub department: Option<String>,
    pub patient_name_normalized: Option<String>,
    pub patient_address: Option<String>,
}

impl VisitRecord {
    /// Tạo lượt khám, `month_key` lấy từ ngày khám.
    pub fn new(date_iso: impl Into<String>, visit_type: VisitType) -> Self {
        let date_iso = date_iso.into();
        Self {
            month_key: month_key_of(&date_iso),
            date_iso,
            visit_type,
            ..Self::default()
        }
    }

    pub fn with_patient_number(mut self, number: i64) -> Self {
        self.patient_number = Some(number);
        self
    }

    pub fn with_birth_date(mut self, birth_date_iso: impl Into<String>) -> Self {
        self.birth_date_iso = Some(birth_date_iso.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient_name_normalized = Some(name.into());
        self
    }

    /// Tháng của lượt khám, ưu tiên `month_key` đã có.
    pub fn month_bucket(&self) -> String {
        let key = self.month_key.trim();
        if key.is_empty() {
            month_key_of(&self.date_iso)
        } else {
            key.to_string()
        }
    }

    pub fn visit_date(&self) -> Option<NaiveDate> {
        parse_iso_date(&self.date_iso)
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date_iso.as_deref().and_then(parse_iso_date)
    }
}

/// Suy ra khóa tháng "YYYY-MM" từ chuỗi ngày ISO.
pub fn month_key_of(date_iso: &str) -> String {
    let trimmed = date_iso.trim();
    trimmed.get(..7).unwrap_or(trimmed).to_string()
}

/// Đọc ngày "YYYY-MM-DD", chấp nhận cả chuỗi datetime có phần giờ phía sau.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            trimmed
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

/// Phân loại cuối cùng của một lượt khám. Mỗi lượt khám có đúng một loại.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum VisitCategory {
    /// Bệnh nhân mới thực sự.
    PureFirst,
    /// Ghi nhận là khám lần đầu nhưng thực ra là bệnh nhân cũ quay lại.
    ReturningFirst,
    Revisit,
    Unknown,
}

/// Lượt khám kèm phân loại và tuổi tại thời điểm khám.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedVisitRecord {
    #[serde(flatten)]
    pub record: VisitRecord,
    pub category: VisitCategory,
    pub age: Option<u32>,
}

/// Thống kê của một tháng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    pub month: String,
    pub total_patients: u32,
    pub pure_first_visits: u32,
    pub returning_first_visits: u32,
    pub revisit_count: u32,
    pub unknown_count: u32,
    pub endoscopy_count: u32,
    /// Số lượt khám có tuổi hợp lệ (mẫu số của `average_age`).
    pub aged_patients: u32,
    pub average_age: Option<f64>,
}

impl MonthlyStat {
    pub fn empty(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            ..Self::default()
        }
    }

    pub fn count_for(&self, category: VisitCategory) -> u32 {
        match category {
            VisitCategory::PureFirst => self.pure_first_visits,
            VisitCategory::ReturningFirst => self.returning_first_visits,
            VisitCategory::Revisit => self.revisit_count,
            VisitCategory::Unknown => self.unknown_count,
        }
    }
}

/// Nhóm tuổi dùng cho biểu đồ phân bố.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBand {
    #[serde(rename = "<20")]
    Under20,
    #[serde(rename = "20-29")]
    Twenties,
    #[serde(rename = "30-39")]
    Thirties,
    #[serde(rename = "40-49")]
    Forties,
    #[serde(rename = "50-59")]
    Fifties,
    #[serde(rename = "60-69")]
    Sixties,
    #[serde(rename = "70-79")]
    Seventies,
    #[serde(rename = "80+")]
    EightyPlus,
    #[serde(rename = "unknown")]
    Unknown,
}

impl AgeBand {
    /// Thứ tự hiển thị cố định.
    pub const ALL: [AgeBand; 9] = [
        AgeBand::Under20,
        AgeBand::Twenties,
        AgeBand::Thirties,
        AgeBand::Forties,
        AgeBand::Fifties,
        AgeBand::Sixties,
        AgeBand::Seventies,
        AgeBand::EightyPlus,
        AgeBand::Unknown,
    ];

    pub fn from_age(age: Option<u32>) -> Self {
        match age {
            None => AgeBand::Unknown,
            Some(0..=19) => AgeBand::Under20,
            Some(20..=29) => AgeBand::Twenties,
            Some(30..=39) => AgeBand::Thirties,
            Some(40..=49) => AgeBand::Forties,
            Some(50..=59) => AgeBand::Fifties,
            Some(60..=69) => AgeBand::Sixties,
            Some(70..=79) => AgeBand::Seventies,
            Some(_) => AgeBand::EightyPlus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBand::Under20 => "<20",
            AgeBand::Twenties => "20-29",
            AgeBand::Thirties => "30-39",
            AgeBand::Forties => "40-49",
            AgeBand::Fifties => "50-59",
            AgeBand::Sixties => "60-69",
            AgeBand::Seventies => "70-79",
            AgeBand::EightyPlus => "80+",
            AgeBand::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgeBandCount {
    pub band: AgeBand,
    pub count: u32,
}

/// Phân bố nhóm tuổi của một tháng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAgeBands {
    pub month: String,
    pub bands: Vec<AgeBandCount>,
}

/// Tổng hợp nhiều tháng liên tiếp cho thẻ KPI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub from: String,
    pub to: String,
    pub months: u32,
    pub total_patients: u32,
    pub pure_first_visits: u32,
    pub returning_first_visits: u32,
    pub revisit_count: u32,
    pub unknown_count: u32,
    pub endoscopy_count: u32,
    pub aged_patients: u32,
    /// Trung bình có trọng số theo `aged_patients` của từng tháng.
    pub average_age: Option<f64>,
}

/// Chênh lệch của một chỉ số giữa hai kỳ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricDelta {
    pub current: u32,
    pub previous: u32,
    pub delta: i64,
    /// `None` khi kỳ trước bằng 0.
    pub percent_change: Option<f64>,
}

/// So sánh kỳ hiện tại với kỳ trước.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    pub total_patients: MetricDelta,
    pub pure_first_visits: MetricDelta,
    pub returning_first_visits: MetricDelta,
    pub revisit_count: MetricDelta,
    pub endoscopy_count: MetricDelta,
    pub average_age_delta: Option<f64>,
}

/// Kết quả tổng hợp cuối cùng của một lần chạy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// Lượt khám đã phân loại, theo thứ tự thời gian trong từng tháng.
    pub classified: Vec<ClassifiedVisitRecord>,
    /// Thống kê theo tháng, tăng dần.
    pub monthly: Vec<MonthlyStat>,
}

impl AnalyticsReport {
    pub fn classified_visits(&self) -> &[ClassifiedVisitRecord] {
        &self.classified
    }

    pub fn monthly_stats(&self) -> &[MonthlyStat] {
        &self.monthly
    }

    /// Tra cứu thống kê theo khóa tháng.
    pub fn month(&self, month: &str) -> Option<&MonthlyStat> {
        self.monthly.iter().find(|stat| stat.month == month)
    }
}

/// Lỗi ở ranh giới tuần tự hóa; bản thân bộ phân loại không bao giờ lỗi.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Dữ liệu đầu vào không chứa danh sách lượt khám")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_type_falls_back_to_unknown() {
        let parsed: Vec<VisitType> =
            serde_json::from_str(r#"["first-visit", " Follow-Up ", "walk-in", null]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                VisitType::FirstVisit,
                VisitType::FollowUp,
                VisitType::Unknown,
                VisitType::Unknown
            ]
        );
    }

    #[test]
    fn record_derives_month_key_when_missing() {
        let record: VisitRecord =
            serde_json::from_str(r#"{"dateIso": "2025-03-14", "visitType": "first-visit"}"#)
                .unwrap();
        assert_eq!(record.month_key, "");
        assert_eq!(record.month_bucket(), "2025-03");
        assert_eq!(VisitRecord::new("2025-03-14", VisitType::Unknown).month_key, "2025-03");
    }

    #[test]
    fn month_key_of_never_splits_multibyte_chars() {
        assert_eq!(month_key_of("20年1月"), "20年1月");
        assert_eq!(month_key_of(""), "");
    }

    #[test]
    fn parse_iso_date_accepts_datetime_suffix() {
        assert_eq!(
            parse_iso_date("2025-01-05T09:30:00"),
            NaiveDate::from_ymd_opt(2025, 1, 5)
        );
        assert_eq!(parse_iso_date("05/01/2025"), None);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: ClassifierConfig =
            serde_json::from_str(r#"{"numberWindow": 50, "endoscopyKeywords": ["GI lab"]}"#)
                .unwrap();
        let defaults = ClassifierConfig::default();

        assert_eq!(cfg.number_window, 50);
        assert_eq!(cfg.endoscopy_keywords, vec!["GI lab".to_string()]);
        assert_eq!(cfg.preventive_care_keywords, defaults.preventive_care_keywords);
        assert_eq!(cfg.max_valid_age, defaults.max_valid_age);
    }

    #[test]
    fn age_band_boundaries() {
        assert_eq!(AgeBand::from_age(Some(19)), AgeBand::Under20);
        assert_eq!(AgeBand::from_age(Some(20)), AgeBand::Twenties);
        assert_eq!(AgeBand::from_age(Some(79)), AgeBand::Seventies);
        assert_eq!(AgeBand::from_age(Some(80)), AgeBand::EightyPlus);
        assert_eq!(AgeBand::from_age(None), AgeBand::Unknown);
        assert_eq!(
            serde_json::to_string(&AgeBand::EightyPlus).unwrap(),
            "\"80+\""
        );
    }
}
