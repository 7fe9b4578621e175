//! Fixed sample issues shown when the backend cannot be reached.

use crate::model::{Issue, IssueId, IssueStatus};

#[must_use]
pub fn fallback_issues() -> Vec<Issue> {
    vec![
        Issue {
            description: "Major pothole causing issues on the main road. It is deep and has \
                          damaged multiple car tires."
                .into(),
            address: "Main Road, near City Bank, Chennai".into(),
            upvotes: 25,
            admin_priority_score: 85.0,
            image_url: "https://placehold.co/600x400/F1F8E8/000000?text=Pothole".into(),
            created_at: Some("2025-09-12T10:00:00Z".into()),
            latitude: Some(13.0827),
            longitude: Some(80.2707),
            ..Issue::new(IssueId(1), "Potholes", IssueStatus::Active)
        },
        Issue {
            description: "Garbage bin overflowing near the central park entrance. Waste has \
                          been piling up for over a week."
                .into(),
            address: "Central Park, Gate 3, Chennai".into(),
            upvotes: 10,
            admin_priority_score: 78.0,
            assigned_employee_name: Some("Ravi Kumar".into()),
            image_url: "https://placehold.co/600x400/F1F8E8/000000?text=Garbage".into(),
            created_at: Some("2025-09-11T14:00:00Z".into()),
            latitude: Some(13.0850),
            longitude: Some(80.2750),
            ..Issue::new(IssueId(2), "Garbage", IssueStatus::InProgress)
        },
        Issue {
            description: "Streetlight is out on 2nd Avenue, making it unsafe at night.".into(),
            address: "2nd Avenue, Anna Nagar, Chennai".into(),
            upvotes: 4,
            admin_priority_score: 60.0,
            assigned_employee_name: Some("Sita Devi".into()),
            image_url: "https://placehold.co/600x400/F1F8E8/000000?text=Streetlight".into(),
            resolved_image_url: Some(
                "https://placehold.co/600x400/95D2B3/white?text=Fixed".into(),
            ),
            satisfied_with_work: Some(true),
            satisfied_with_speed: Some(false),
            created_at: Some("2025-09-10T08:00:00Z".into()),
            latitude: Some(13.0870),
            longitude: Some(80.2100),
            ..Issue::new(IssueId(3), "Streetlights", IssueStatus::Resolved)
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_covers_every_status() {
        let issues = fallback_issues();
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].status, IssueStatus::Active);
        assert_eq!(issues[1].status, IssueStatus::InProgress);
        assert_eq!(issues[2].status, IssueStatus::Resolved);
    }

    #[test]
    fn test_fallback_ids_are_unique() {
        let issues = fallback_issues();
        let mut ids: Vec<_> = issues.iter().map(|i| i.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), issues.len());
    }

    #[test]
    fn test_fallback_feedback_only_on_resolved() {
        for issue in fallback_issues() {
            if issue.satisfied_with_work.is_some() {
                assert!(issue.status.is_resolved());
            }
        }
    }
}
