use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// Perspective assigned to each member of a research council, in seat order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCount)]
pub enum ResearchRole {
    StateOfTheArt,
    CriticalAnalyst,
    OptimisticVisionary,
    HistoricalContext,
}

/// Officers a research council needs: one per role
pub const RESEARCH_COUNCIL_SIZE: usize = ResearchRole::COUNT;

impl ResearchRole {
    pub fn name(&self) -> &'static str {
        match self {
            ResearchRole::StateOfTheArt => "State-of-the-Art Researcher",
            ResearchRole::CriticalAnalyst => "Critical Analyst",
            ResearchRole::OptimisticVisionary => "Optimistic Visionary",
            ResearchRole::HistoricalContext => "Historical Context Provider",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            ResearchRole::StateOfTheArt => {
                "Focus on current best practices, leading solutions, and latest developments. \
                 Cite specific examples and provide concrete evidence."
            }
            ResearchRole::CriticalAnalyst => {
                "Identify counterexamples, flaws, limitations, and risks. \
                 Challenge assumptions and highlight edge cases."
            }
            ResearchRole::OptimisticVisionary => {
                "Explore futuristic possibilities, emerging technologies, and 'what if' scenarios. \
                 Think 3-5 years ahead."
            }
            ResearchRole::HistoricalContext => {
                "Explain the evolution of this field, past attempts, lessons learned, \
                 and provide historical perspective."
            }
        }
    }

    /// Role for a seat index (0..4)
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }
}
