//! Built-in Dubai tourism topic catalog.

use super::Topic;

/// (category, topic, keywords, priority)
type Entry = (&'static str, &'static str, &'static [&'static str], u8);

const BUILTIN: &[Entry] = &[
    // attractions
    ("attractions", "Burj Khalifa", &["burj khalifa", "at the top", "observation deck", "tallest building"], 1),
    ("attractions", "Dubai Mall", &["dubai mall", "shopping", "aquarium", "fountain"], 1),
    ("attractions", "Museum of the Future", &["museum of the future", "futuristic", "technology", "innovation"], 1),
    ("attractions", "Dubai Frame", &["dubai frame", "landmark", "observation", "photo spot"], 2),
    ("attractions", "Dubai Miracle Garden", &["miracle garden", "flowers", "floral", "garden"], 2),
    ("attractions", "Global Village", &["global village", "cultural", "entertainment", "festival"], 2),
    ("attractions", "Dubai Fountain", &["dubai fountain", "water show", "evening", "downtown"], 1),
    ("attractions", "Palm Jumeirah", &["palm jumeirah", "island", "luxury", "beach"], 1),
    ("attractions", "Atlantis The Palm", &["atlantis", "resort", "aquaventure", "waterpark"], 1),
    ("attractions", "Ain Dubai", &["ain dubai", "ferris wheel", "observation", "bluewaters"], 2),
    ("attractions", "Dubai Opera", &["dubai opera", "cultural", "performance", "downtown"], 3),
    ("attractions", "IMG Worlds of Adventure", &["img worlds", "theme park", "indoor", "adventure"], 2),
    ("attractions", "Legoland Dubai", &["legoland", "family", "kids", "theme park"], 2),
    ("attractions", "Wild Wadi", &["wild wadi", "waterpark", "family", "swimming"], 3),
    // hotels
    ("hotels", "Burj Al Arab", &["burj al arab", "7 star", "luxury", "iconic"], 1),
    ("hotels", "Dubai Marina Hotels", &["dubai marina", "waterfront", "skyline", "modern"], 2),
    ("hotels", "Downtown Dubai Hotels", &["downtown dubai", "city center", "burj khalifa view"], 2),
    ("hotels", "JBR Beach Hotels", &["jbr", "jumeirah beach", "beachfront", "walk"], 2),
    ("hotels", "Desert Resort", &["desert resort", "arabian", "luxury camp", "dunes"], 2),
    ("hotels", "Budget Hotels Dubai", &["budget", "affordable", "cheap hotels", "backpacker"], 3),
    // experiences
    ("experiences", "Desert Safari", &["desert safari", "dune bashing", "camel ride", "bbq dinner"], 1),
    ("experiences", "Dubai Beaches", &["beach", "jumeirah", "kite beach", "swimming"], 1),
    ("experiences", "Yacht Cruise", &["yacht", "cruise", "marina", "luxury boat"], 2),
    ("experiences", "Skydiving Dubai", &["skydive", "palm dropzone", "adventure", "extreme"], 2),
    ("experiences", "Hot Air Balloon", &["hot air balloon", "sunrise", "desert view", "flying"], 2),
    ("experiences", "Dhow Cruise", &["dhow cruise", "dubai creek", "dinner cruise", "traditional"], 2),
    ("experiences", "Scuba Diving", &["scuba diving", "underwater", "marine life", "diving"], 3),
    // dining
    ("dining", "Fine Dining Dubai", &["fine dining", "michelin", "gourmet", "luxury restaurant"], 1),
    ("dining", "Rooftop Restaurants", &["rooftop", "skyline view", "evening dining", "atmosphere"], 2),
    ("dining", "Arabic Cuisine", &["arabic food", "middle eastern", "traditional", "local cuisine"], 2),
    ("dining", "Friday Brunch", &["friday brunch", "buffet", "champagne", "weekend"], 2),
    ("dining", "Street Food Dubai", &["street food", "cheap eats", "local food", "casual"], 3),
    // shopping
    ("shopping", "Mall of Emirates", &["mall of emirates", "ski dubai", "shopping"], 2),
    ("shopping", "Gold Souk", &["gold souk", "traditional market", "jewelry", "gold"], 1),
    ("shopping", "Spice Souk", &["spice souk", "traditional", "aromatic", "local market"], 2),
    ("shopping", "Dubai Shopping Festival", &["shopping festival", "sales", "winter", "deals"], 2),
    // culture
    ("culture", "Al Fahidi Historic", &["al fahidi", "historic", "old dubai", "heritage"], 2),
    ("culture", "Jumeirah Mosque", &["jumeirah mosque", "islamic", "architecture", "religious"], 2),
    ("culture", "Dubai Creek", &["dubai creek", "abra", "traditional", "old dubai"], 2),
    ("culture", "Alserkal Avenue", &["alserkal", "art", "galleries", "creative"], 1),
    ("culture", "Etihad Museum", &["etihad museum", "history", "uae", "heritage"], 2),
    // nightlife
    ("nightlife", "Rooftop Bars", &["rooftop bar", "skyline", "cocktails", "evening"], 2),
    ("nightlife", "Dubai Marina Nightlife", &["marina nightlife", "bars", "promenade", "evening"], 2),
    // family
    ("family", "Aquarium Dubai Mall", &["aquarium", "underwater zoo", "marine life", "family"], 1),
    ("family", "KidZania Dubai", &["kidzania", "kids activities", "educational", "fun"], 2),
    ("family", "Dubai Parks and Resorts", &["dubai parks", "motiongate", "legoland", "theme park"], 1),
    // transportation
    ("transportation", "Dubai Metro", &["dubai metro", "train", "public transport", "station"], 2),
    ("transportation", "Dubai Airport", &["dxb airport", "terminal", "international", "arrival"], 2),
    ("transportation", "Dubai Tram", &["tram", "marina", "jbr", "transport"], 3),
    // skyline
    ("skyline", "Dubai Skyline", &["skyline", "cityscape", "modern", "skyscrapers"], 1),
    ("skyline", "Downtown Dubai", &["downtown", "city center", "burj khalifa", "urban"], 1),
    ("skyline", "Dubai Marina Skyline", &["marina skyline", "towers", "waterfront", "modern"], 1),
    ("skyline", "Business Bay", &["business bay", "canal", "modern architecture", "towers"], 2),
    // neighborhoods
    ("neighborhoods", "Dubai Marina", &["dubai marina", "waterfront", "towers", "promenade"], 1),
    ("neighborhoods", "Jumeirah Beach Residence JBR", &["jbr", "beach", "walk", "beachfront"], 1),
    ("neighborhoods", "DIFC", &["difc", "financial", "art", "galleries"], 1),
    ("neighborhoods", "City Walk", &["city walk", "shopping", "dining", "modern"], 2),
    ("neighborhoods", "La Mer", &["la mer", "beach", "entertainment", "dining"], 1),
    ("neighborhoods", "Deira", &["deira", "traditional", "souks", "old dubai"], 1),
    ("neighborhoods", "Al Seef", &["al seef", "heritage", "creek", "waterfront"], 1),
    ("neighborhoods", "Bur Dubai", &["bur dubai", "creek", "heritage", "traditional"], 1),
    ("neighborhoods", "Dubai Creek Harbour", &["creek harbour", "modern", "tower", "waterfront"], 1),
    ("neighborhoods", "Dubai Hills Estate", &["dubai hills", "golf", "mall", "luxury"], 1),
    ("neighborhoods", "Expo City Dubai", &["expo city", "expo 2020", "innovation", "sustainability"], 1),
    // beaches and nature
    ("beaches", "Kite Beach", &["kite beach", "beach", "sports", "kites"], 1),
    ("beaches", "Jumeirah Beach", &["jumeirah beach", "beach", "swimming", "sun"], 1),
    ("nature", "Al Qudra Lakes", &["al qudra", "lakes", "desert", "nature"], 1),
    ("nature", "Love Lake", &["love lake", "heart shaped", "desert", "romantic"], 1),
    ("nature", "Hatta Dam", &["hatta", "dam", "mountains", "nature"], 1),
    ("nature", "Ras Al Khor Wildlife Sanctuary", &["ras al khor", "wildlife", "flamingos", "nature"], 2),
    // viewpoints
    ("viewpoints", "Sky Views Observatory", &["sky views", "observation", "glass floor", "downtown"], 1),
    ("viewpoints", "The View at The Palm", &["view palm", "observation", "palm jumeirah", "360"], 1),
    ("viewpoints", "Marina Walk", &["marina walk", "promenade", "yachts", "skyline"], 1),
    ("viewpoints", "Sunset Beach Burj Al Arab", &["sunset beach", "burj al arab", "golden hour", "iconic"], 1),
];

/// The built-in topics in declaration order.
pub fn builtin_topics() -> Vec<Topic> {
    BUILTIN
        .iter()
        .map(|(category, name, keywords, priority)| Topic {
            name: name.to_string(),
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            priority: *priority,
        })
        .collect()
}
