use crate::domain::lead::{FollowUpStatus, SalesStatus, WorkStatus};

pub const MAX_STATUS_WEIGHT: u8 = 5;

impl FollowUpStatus {
    pub const fn weight(self) -> u8 {
        match self {
            Self::AppointmentScheduled => 5,
            Self::QuotationSent => 4,
            Self::Interested => 4,
            Self::CallBackRequested => 3,
            Self::NoResponse => 1,
            Self::NotInterested => 0,
            Self::Unknown => 0,
        }
    }
}

impl SalesStatus {
    pub const fn weight(self) -> u8 {
        match self {
            Self::Negotiation => 5,
            Self::ProposalSent => 4,
            Self::Qualified => 3,
            Self::Contacted => 2,
            Self::New => 1,
            Self::Closed => 0,
            Self::Unknown => 0,
        }
    }
}

impl WorkStatus {
    pub const fn weight(self) -> u8 {
        match self {
            Self::Done => 0,
            Self::Working => 2,
            Self::NotStarted => 4,
        }
    }
}
